use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use appointment_export::pipeline::export::gender_chart;
use appointment_export::{logging, Config, Pipeline, RecordErrorPolicy};

#[derive(Parser)]
#[command(name = "appointment_export")]
#[command(about = "Flatten appointment JSON into a delimited table with derived patient columns")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Config file (defaults to config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Appointment JSON export to read
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the table, aggregates and chart
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Directory for output files
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// What to do when a single appointment fails to enrich
        #[arg(long, value_enum)]
        on_record_error: Option<RecordErrorPolicy>,
        /// Skip rendering the gender chart
        #[arg(long)]
        no_chart: bool,
    },
    /// Load and enrich without writing anything; print a summary
    Inspect {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn load_config(source: &SourceArgs) -> anyhow::Result<Config> {
    let mut config = Config::load(source.config.as_deref()).context("loading configuration")?;
    if let Some(input) = &source.input {
        config.input.path = input.clone();
    }
    Ok(config)
}

fn run(config: Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let result = pipeline.run()?;

    println!("\n📊 Export results:");
    println!("   Appointments: {}", result.total_appointments);
    println!("   Rows written: {}", result.rows_written);
    println!("   Aggregates:   {}", result.aggregates_written);
    println!("   Skipped:      {}", result.skipped.len());
    println!("   Table:        {}", result.table_file.display());
    println!("   Aggregates:   {}", result.aggregates_file.display());
    if let Some(chart) = &result.chart_file {
        println!("   Chart:        {}", chart.display());
    }
    if !result.skipped.is_empty() {
        println!("\n⚠️  Skipped derivations:");
        for message in &result.skipped {
            println!("   - {}", message);
        }
    }
    Ok(())
}

fn inspect(config: Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let batch = pipeline.prepare()?;

    println!("🔍 {} appointments", batch.records.len());
    println!("\nBy gender:");
    for slice in gender_chart(&batch).slices {
        println!("   {:<8} {}", slice.label, slice.count);
    }

    let (total, active) = batch
        .medicine_index
        .iter()
        .fold((0, 0), |(t, a), (_, agg)| {
            (t + agg.no_of_medicines, a + agg.no_of_active_medicines)
        });
    println!("\nMedicines: {} prescribed, {} active, {} inactive", total, active, total - active);
    if !batch.skipped.is_empty() {
        println!("Skipped derivations: {}", batch.skipped.len());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging(Path::new("logs"));

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            source,
            output_dir,
            on_record_error,
            no_chart,
        } => {
            println!("🚀 Running appointment export...");
            let mut config = load_config(&source)?;
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if let Some(policy) = on_record_error {
                config.pipeline.on_record_error = policy;
            }
            if no_chart {
                config.output.chart_enabled = false;
            }
            info!(input = %config.input.path.display(), "Starting export");
            run(config)
        }
        Commands::Inspect { source } => inspect(load_config(&source)?),
    };

    if let Err(e) = &outcome {
        error!("Run failed: {:#}", e);
    }
    outcome
}
