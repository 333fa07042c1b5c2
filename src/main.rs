use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use roster_pipeline::constants::ENV_METRICS_PORT;
use roster_pipeline::handler::{self, HandlerEvent};
use roster_pipeline::observability;
use roster_pipeline::{Config, Pipeline, RunSummary, Stage};

#[derive(Parser)]
#[command(name = "roster_pipeline")]
#[command(about = "Employee roster ingestion and schema normalization")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download raw files for one or all enabled sources
    Fetch {
        /// Source key from the config file
        #[arg(long)]
        source: Option<String>,
    },
    /// Normalize already downloaded raw files and write CSV + Parquet
    Process {
        #[arg(long)]
        source: Option<String>,
    },
    /// Fetch, then process
    Run {
        #[arg(long)]
        source: Option<String>,
    },
    /// Handle a JSON event the way the deployed function would
    Handler {
        /// Event payload, e.g. '{"processor_input": {"run_processor_id": "1"}}'
        #[arg(long)]
        event: String,
        #[arg(long, value_enum, default_value_t = HandlerStage::Process)]
        stage: HandlerStage,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HandlerStage {
    Process,
    Full,
}

impl From<HandlerStage> for Stage {
    fn from(stage: HandlerStage) -> Self {
        match stage {
            HandlerStage::Process => Stage::Process,
            HandlerStage::Full => Stage::Full,
        }
    }
}

async fn run_stage(pipeline: &Pipeline, source: Option<String>, stage: Stage) -> RunSummary {
    match source {
        Some(key) => pipeline.process_keys(&[key], stage).await,
        None => pipeline.process_all(stage).await,
    }
}

fn print_summary(summary: &RunSummary) {
    println!("Run {} ({:?})", summary.run_id, summary.stage);
    for outcome in &summary.outcomes {
        match (&outcome.result, &outcome.error) {
            (_, Some(e)) => println!("  {:<24} FAILED  {}", outcome.source_key, e),
            (Some(result), None) => {
                let rows = result.report.as_ref().map(|r| r.rows).unwrap_or(0);
                let defects = result.report.as_ref().map(|r| r.total_defects()).unwrap_or(0);
                println!(
                    "  {:<24} ok      rows={} defects={} raw={}",
                    outcome.source_key,
                    rows,
                    defects,
                    result.raw_path.display()
                );
            }
            (None, None) => println!("  {:<24} ok", outcome.source_key),
        }
    }
    println!("  {} succeeded, {} failed", summary.succeeded(), summary.failed());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_logging();
    if std::env::var(ENV_METRICS_PORT).is_ok() {
        observability::init_metrics();
    }

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    let pipeline = Pipeline::from_config(config).context("building pipeline")?;

    let summary = match cli.command {
        Commands::Fetch { source } => run_stage(&pipeline, source, Stage::Fetch).await,
        Commands::Process { source } => run_stage(&pipeline, source, Stage::Process).await,
        Commands::Run { source } => run_stage(&pipeline, source, Stage::Full).await,
        Commands::Handler { event, stage } => {
            let event: HandlerEvent =
                serde_json::from_str(&event).context("parsing handler event")?;
            let response = handler::handle(&pipeline, &event, stage.into()).await;
            info!(status = response.status_code, "Handler finished");
            println!("{}", serde_json::to_string_pretty(&response)?);
            if response.status_code != 200 {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    print_summary(&summary);
    if summary.failed() > 0 {
        error!(failed = summary.failed(), "Some sources failed");
        std::process::exit(1);
    }
    Ok(())
}
