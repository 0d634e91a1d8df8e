use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::pipeline::processing::enrich::MedicineIndex;

/// Serialize the whole medicine index with four-space indentation.
pub fn write_aggregates<W: Write>(index: &MedicineIndex, out: W) -> Result<()> {
    let value = index.to_json()?;
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(out, formatter);
    value.serialize(&mut serializer)?;
    Ok(())
}

pub fn write_aggregates_file(index: &MedicineIndex, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_aggregates(index, &mut out)?;
    out.flush().map_err(|e| PipelineError::io(path, e))
}
