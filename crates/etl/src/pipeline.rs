//! Extract, transform and load for one trading date.

use chrono::NaiveDate;
use fx_core::{config::EtlConfig, Bar, BarInterval, Result};
use fx_ingestion::{reader::QUOTE_COLUMNS, write_bars, BarBuilder, TickTable};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct EtlSummary {
    /// Trading date the bars were built for.
    pub target_date: NaiveDate,
    /// Bar width.
    pub interval: BarInterval,
    /// Rows in the tick file.
    pub rows_read: usize,
    /// Rows dropped for lacking a required value.
    pub rows_skipped: usize,
    /// Quotes on the target date.
    pub quotes_on_date: usize,
    /// Bars in the output file.
    pub bars_written: usize,
    /// Location of the written bar file.
    pub output_path: PathBuf,
}

/// Bars built from a tick table, with the counts a run reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    /// Bars ordered by pair, then bucket start.
    pub bars: Vec<Bar>,
    /// Rows dropped for lacking a required value.
    pub rows_skipped: usize,
    /// Quotes on the target date.
    pub quotes_on_date: usize,
}

/// Read the tick table for a run.
pub fn extract(path: &Path) -> Result<TickTable> {
    TickTable::from_path(path)
}

/// Check the schema and build bars.
pub fn transform(table: &TickTable, builder: &BarBuilder) -> Result<Transformed> {
    table.require_columns(&QUOTE_COLUMNS)?;
    let batch = table.quotes();
    let (bars, quotes_on_date) = builder.build_counted(&batch.quotes)?;
    Ok(Transformed {
        bars,
        rows_skipped: batch.skipped,
        quotes_on_date,
    })
}

/// Persist bars.
pub fn load(bars: &[Bar], path: &Path) -> Result<()> {
    write_bars(path, bars)
}

/// Tick-to-bar pipeline for one input file and one trading date.
#[derive(Debug, Clone)]
pub struct EtlPipeline {
    input_path: PathBuf,
    output_path: PathBuf,
    builder: BarBuilder,
}

impl EtlPipeline {
    /// Create a pipeline with explicit locations.
    pub fn new(input_path: PathBuf, output_path: PathBuf, builder: BarBuilder) -> Self {
        Self {
            input_path,
            output_path,
            builder,
        }
    }

    /// Create a pipeline from configuration. Input path and target date must be set.
    pub fn from_config(config: &EtlConfig) -> Result<Self> {
        let target_date = config.target_date()?;
        Ok(Self::new(
            config.input_path()?.to_path_buf(),
            config.output_path(target_date),
            BarBuilder::new(target_date, config.interval),
        ))
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Run the pipeline.
    ///
    /// Nothing is written unless every step succeeds.
    pub fn run(&self) -> Result<EtlSummary> {
        let date = self.builder.target_date();
        tracing::info!(
            input = %self.input_path.display(),
            date = %date,
            interval = %self.builder.interval(),
            "starting bar pipeline"
        );

        let table = extract(&self.input_path)?;
        tracing::info!(rows = table.len(), "extracted tick table");

        let Transformed {
            bars,
            rows_skipped,
            quotes_on_date,
        } = transform(&table, &self.builder)?;
        tracing::info!(quotes = quotes_on_date, bars = bars.len(), "built bars");

        load(&bars, &self.output_path)?;
        tracing::info!(output = %self.output_path.display(), "wrote bars");

        Ok(EtlSummary {
            target_date: date,
            interval: self.builder.interval(),
            rows_read: table.len(),
            rows_skipped,
            quotes_on_date,
            bars_written: bars.len(),
            output_path: self.output_path.clone(),
        })
    }
}
