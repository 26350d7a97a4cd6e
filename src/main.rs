mod chart;
mod config;
mod error;
mod indicator;
mod loader;
mod model;
mod pipeline;
mod report;
mod stats;

use std::path::{Path, PathBuf};

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use pipeline::PipelineOutcome;

const DEFAULT_CONFIG_PATH: &str = "analysis.toml";

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("analysis failed")]
    Pipeline,
}

#[derive(Parser)]
#[command(
    name = "coin-analyzer",
    about = "Moving averages, returns and volatility charts for a daily OHLCV file"
)]
struct Cli {
    /// Input CSV file; defaults to `bitcoin_data.csv`
    input: Option<PathBuf>,

    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that receives the charts and the report
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli).change_context(AppError::Config)?;

    init_tracing(&config);

    match pipeline::run(&config).change_context(AppError::Pipeline)? {
        PipelineOutcome::Completed {
            rows,
            charts,
            report,
        } => info!(
            rows,
            charts = charts.len(),
            report = %report.display(),
            "analysis complete"
        ),
        PipelineOutcome::LoadFailed => info!("no input loaded; nothing written"),
    }
    Ok(())
}

/// An explicit `--config` must exist; the default file is optional.
fn resolve_config(cli: &Cli) -> Result<AppConfig, Report<error::ConfigError>> {
    let mut config = match &cli.config {
        Some(path) => config::load(path)?,
        None => config::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
    };

    if let Some(input) = &cli.input {
        config.input.path = input.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    Ok(config)
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
