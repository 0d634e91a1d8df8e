use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::FlatRecord;
use crate::error::{PipelineError, Result};

/// Writes rows as delimited text with a single-character separator.
///
/// Fields holding the separator, a quote or a line break are quoted, with
/// embedded quotes doubled. Null values become empty fields.
#[derive(Debug, Clone, Copy)]
pub struct TableWriter {
    delimiter: char,
}

impl TableWriter {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Union of all row keys, in first-appearance order.
    pub fn header(records: &[FlatRecord]) -> Vec<String> {
        let mut header: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !header.iter().any(|h| h == key) {
                    header.push(key.to_string());
                }
            }
        }
        header
    }

    pub fn write<W: Write>(&self, records: &[FlatRecord], out: &mut W) -> std::io::Result<()> {
        let header = Self::header(records);
        self.write_line(out, header.iter().map(|h| self.escape(h)))?;
        for record in records {
            let cells = header
                .iter()
                .map(|column| self.escape(&cell_text(record.get(column))));
            self.write_line(out, cells)?;
        }
        out.flush()
    }

    pub fn write_file(&self, records: &[FlatRecord], path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        let mut out = BufWriter::new(file);
        self.write(records, &mut out)
            .map_err(|e| PipelineError::io(path, e))
    }

    fn write_line<W: Write>(
        &self,
        out: &mut W,
        cells: impl Iterator<Item = String>,
    ) -> std::io::Result<()> {
        let mut separator = [0u8; 4];
        let separator = self.delimiter.encode_utf8(&mut separator).as_bytes();
        for (i, cell) in cells.enumerate() {
            if i > 0 {
                out.write_all(separator)?;
            }
            out.write_all(cell.as_bytes())?;
        }
        out.write_all(b"\n")
    }

    fn escape(&self, field: &str) -> String {
        let needs_quotes = field
            .chars()
            .any(|c| c == self.delimiter || c == '"' || c == '\n' || c == '\r');
        if needs_quotes {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

/// Text for one cell. Strings are written raw, booleans as `True`/`False`,
/// nested values as compact JSON.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    }
}
