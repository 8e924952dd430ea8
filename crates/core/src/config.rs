//! Configuration structures for the fx-bars system.

use crate::error::{Error, Result};
use crate::types::BarInterval;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tick-to-bar pipeline configuration.
    pub etl: EtlConfig,
    /// Provider evaluation configuration.
    pub providers: ProviderConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}

/// Tick-to-bar pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Tick file for the trading date.
    pub input_path: Option<PathBuf>,
    /// Root of the date-partitioned output tree.
    pub output_root: PathBuf,
    /// File name written inside the date partition.
    pub output_file_name: String,
    /// Trading date to keep. Never inferred.
    pub target_date: Option<NaiveDate>,
    /// Bar width.
    pub interval: BarInterval,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            output_root: PathBuf::from("ohlc_data"),
            output_file_name: "data.csv.gz".to_string(),
            target_date: None,
            interval: BarInterval::one_minute(),
        }
    }
}

impl EtlConfig {
    /// Target date, which must be supplied explicitly.
    pub fn target_date(&self) -> Result<NaiveDate> {
        self.target_date
            .ok_or_else(|| Error::config("target date is not set"))
    }

    /// Input tick file.
    pub fn input_path(&self) -> Result<&Path> {
        self.input_path
            .as_deref()
            .ok_or_else(|| Error::config("input path is not set"))
    }

    /// Date-partitioned output location: `<root>/date=YYYY-MM-DD/<file>`.
    pub fn output_path(&self, date: NaiveDate) -> PathBuf {
        self.output_root
            .join(format!("date={}", date.format("%Y-%m-%d")))
            .join(&self.output_file_name)
    }
}

/// Provider evaluation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Directory holding one tick file per provider.
    pub input_dir: Option<PathBuf>,
    /// File name suffix identifying tick files.
    pub file_suffix: String,
    /// Quantile above which absolute returns count as outliers.
    pub outlier_quantile: f64,
    /// Composite score weights.
    pub scoring: ScoringWeights,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            file_suffix: ".csv.gz".to_string(),
            outlier_quantile: 0.999,
            scoring: ScoringWeights::default(),
        }
    }
}

impl ProviderConfig {
    /// Directory holding provider tick files.
    pub fn input_dir(&self) -> Result<&Path> {
        self.input_dir
            .as_deref()
            .ok_or_else(|| Error::config("provider input directory is not set"))
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.outlier_quantile) {
            return Err(Error::config(format!(
                "outlier quantile must be within [0, 1], got {}",
                self.outlier_quantile
            )));
        }
        Ok(())
    }
}

/// Weights for the composite provider score.
///
/// `final = spread * (1 / avg_spread) + volume * avg_volume - penalty * issues`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight on inverse average spread.
    pub spread: f64,
    /// Weight on average volume.
    pub volume: f64,
    /// Weight on the count of data quality issues.
    pub penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            spread: 1.0,
            volume: 1e-6,
            penalty: 1e-3,
        }
    }
}
