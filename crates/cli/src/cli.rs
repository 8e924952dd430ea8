//! Command-line parsing and dispatch.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fx_analysis::ProviderEvaluator;
use fx_core::{BarInterval, Config};
use fx_etl::EtlPipeline;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fx-bars")]
#[command(about = "FX tick data to OHLC bars, plus tick provider evaluation", long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build OHLC bars for one trading date
    Etl {
        /// Tick file (gzip CSV) for the trading date
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Root of the date-partitioned output tree
        #[arg(short, long)]
        output_root: Option<PathBuf>,
        /// Trading date to keep (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Bar width that divides a day, e.g. 1min, 5min, 30s
        #[arg(long)]
        interval: Option<BarInterval>,
    },
    /// Compare tick data providers and select the best one
    Providers {
        /// Directory with one tick file per provider
        #[arg(short, long)]
        input_dir: Option<PathBuf>,
        /// Write the full evaluation as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
}

impl Commands {
    /// Prefix for failure messages.
    pub fn label(&self) -> &'static str {
        match self {
            Commands::Etl { .. } => "ETL",
            Commands::Providers { .. } => "Provider analysis",
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Run a parsed command, returning the confirmation message.
pub fn run(cli: Cli) -> Result<String> {
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Etl {
            input,
            output_root,
            date,
            interval,
        } => {
            let etl = &mut config.etl;
            if input.is_some() {
                etl.input_path = input;
            }
            if let Some(root) = output_root {
                etl.output_root = root;
            }
            if date.is_some() {
                etl.target_date = date;
            }
            if let Some(interval) = interval {
                etl.interval = interval;
            }

            let summary = EtlPipeline::from_config(etl)?.run()?;
            Ok(format!(
                "ETL completed successfully ({} OHLC): {} bars written to {}",
                summary.interval,
                summary.bars_written,
                summary.output_path.display()
            ))
        }
        Commands::Providers { input_dir, report } => {
            let providers = &mut config.providers;
            if input_dir.is_some() {
                providers.input_dir = input_dir;
            }

            let evaluation = ProviderEvaluator::new(providers.clone())?.run()?;
            if let Some(path) = &report {
                evaluation
                    .write_json(path)
                    .with_context(|| format!("writing report {}", path.display()))?;
            }
            Ok(evaluation.to_string())
        }
    }
}

/// Print the outcome of a run and return the process exit status.
///
/// The message goes to `stdout` on success (status 0); on failure
/// `<label> failed: <error>` goes to `stderr` (status 1).
pub fn report<O: Write, E: Write>(
    label: &str,
    outcome: Result<String>,
    stdout: &mut O,
    stderr: &mut E,
) -> u8 {
    match outcome {
        Ok(message) => {
            let _ = writeln!(stdout, "{message}");
            0
        }
        Err(err) => {
            tracing::debug!(error = ?err, "run failed");
            let _ = writeln!(stderr, "{label} failed: {err:#}");
            1
        }
    }
}
