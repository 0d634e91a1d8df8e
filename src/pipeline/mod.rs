// Appointment export pipeline: ingestion, processing, and export

pub mod export;
pub mod ingestion;
pub mod processing;

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::constants::DEFAULT_FIELD_PATHS;
use crate::error::Result;
use export::ExportedFiles;
use processing::{flatten_all, DefaultEnricher, EnrichedBatch, Enricher, FieldPaths};

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub total_appointments: usize,
    pub rows_written: usize,
    pub aggregates_written: usize,
    /// Record-level failures that were skipped
    pub skipped: Vec<String>,
    pub table_file: PathBuf,
    pub aggregates_file: PathBuf,
    pub chart_file: Option<PathBuf>,
}

/// Linear batch pipeline: load, flatten, enrich, export.
pub struct Pipeline {
    config: Config,
    paths: FieldPaths,
    enricher: DefaultEnricher,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let paths = FieldPaths::new(DEFAULT_FIELD_PATHS)?;
        let enricher = DefaultEnricher::new(config.pipeline.on_record_error);
        Ok(Self {
            config,
            paths,
            enricher,
        })
    }

    /// Compute ages against a fixed date instead of today.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.enricher = self.enricher.with_as_of(as_of);
        self
    }

    /// Load, flatten and enrich without writing anything.
    #[instrument(skip(self), fields(input = %self.config.input.path.display()))]
    pub fn prepare(&self) -> Result<EnrichedBatch> {
        let appointments = ingestion::load_appointments(&self.config.input.path)?;
        let records = flatten_all(&appointments, &self.paths);
        info!("Flattened {} appointments", records.len());
        self.enricher.enrich(&appointments, records)
    }

    /// Run the whole pipeline and write every output.
    pub fn run(&self) -> Result<PipelineResult> {
        let started = Instant::now();
        let batch = self.prepare()?;
        let files: ExportedFiles = export::export(&batch, &self.config.output)?;

        if !batch.skipped.is_empty() {
            warn!("{} record-level errors skipped during run", batch.skipped.len());
        }
        info!(
            "Pipeline finished in {:.3}s",
            started.elapsed().as_secs_f64()
        );

        Ok(PipelineResult {
            total_appointments: batch.records.len(),
            rows_written: batch.records.len(),
            aggregates_written: batch.medicine_index.len(),
            skipped: batch.skipped,
            table_file: files.table,
            aggregates_file: files.aggregates,
            chart_file: files.chart,
        })
    }
}
