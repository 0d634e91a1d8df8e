// Pipeline ingestion: read the appointment export into memory

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::error::{PipelineError, Result};

/// Read a JSON file holding a top-level array of appointment objects.
///
/// The whole file is read and parsed before anything else runs; an unreadable
/// path, malformed JSON or a non-array document aborts the run.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_appointments(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let appointments = parse_appointments(&content)?;
    info!("Loaded {} appointments", appointments.len());
    Ok(appointments)
}

pub fn parse_appointments(content: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(content)? {
        Value::Array(items) => Ok(items),
        other => Err(PipelineError::InputShape(json_kind(&other).to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
