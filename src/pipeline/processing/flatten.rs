use serde_json::Value;
use std::collections::HashSet;

use crate::domain::FlatRecord;
use crate::error::{PipelineError, Result};

/// An ordered list of dotted field paths (e.g. `patientDetails.gender`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPaths {
    paths: Vec<String>,
}

impl FieldPaths {
    /// Build a path list, rejecting repeated paths.
    pub fn new<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for path in paths {
            let path = path.into();
            if !seen.insert(path.clone()) {
                return Err(PipelineError::DuplicatePath(path));
            }
            ordered.push(path);
        }
        Ok(Self { paths: ordered })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Walk `path` through nested objects. Any non-object step or absent key
/// yields `None`.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            _ => None,
        })
}

/// Project one appointment onto `paths`, writing null for anything missing.
pub fn flatten(item: &Value, paths: &FieldPaths) -> FlatRecord {
    let mut record = FlatRecord::new();
    for path in paths.iter() {
        record.insert(path, lookup(item, path).cloned().unwrap_or(Value::Null));
    }
    record
}

pub fn flatten_all(items: &[Value], paths: &FieldPaths) -> Vec<FlatRecord> {
    items.iter().map(|item| flatten(item, paths)).collect()
}
