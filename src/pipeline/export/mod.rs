// Pipeline export: delimited table, medicine aggregates and gender chart

use std::fs;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::config::OutputConfig;
use crate::constants::PATIENT_GENDER;
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::enrich::EnrichedBatch;

pub mod aggregates;
pub mod chart;
pub mod table;

pub use aggregates::write_aggregates_file;
pub use chart::{value_counts, PieChart, PieSlice};
pub use table::TableWriter;

pub const CHART_TITLE: &str = "Number of Appointments by Gender";

/// Where each artifact of a run was written.
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub table: PathBuf,
    pub aggregates: PathBuf,
    pub chart: Option<PathBuf>,
}

/// Build the gender distribution chart for a set of rows.
pub fn gender_chart(batch: &EnrichedBatch) -> PieChart {
    PieChart::new(CHART_TITLE, value_counts(&batch.records, PATIENT_GENDER))
}

/// Write the table, the aggregate index and (when enabled) the chart.
#[instrument(skip_all, fields(rows = batch.records.len()))]
pub fn export(batch: &EnrichedBatch, output: &OutputConfig) -> Result<ExportedFiles> {
    fs::create_dir_all(&output.dir).map_err(|e| PipelineError::io(&output.dir, e))?;

    let table_path = output.table_path();
    TableWriter::new(output.delimiter_char()?).write_file(&batch.records, &table_path)?;
    info!("Wrote {} rows to {}", batch.records.len(), table_path.display());

    let aggregates_path = output.aggregates_path();
    write_aggregates_file(&batch.medicine_index, &aggregates_path)?;
    info!(
        "Wrote {} medicine aggregates to {}",
        batch.medicine_index.len(),
        aggregates_path.display()
    );

    let chart_path = match output.chart_path() {
        Some(path) => {
            gender_chart(batch).render_to_file(&path)?;
            info!("Rendered gender chart to {}", path.display());
            Some(path)
        }
        None => None,
    };

    Ok(ExportedFiles {
        table: table_path,
        aggregates: aggregates_path,
        chart: chart_path,
    })
}
