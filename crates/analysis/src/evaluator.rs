//! Provider evaluation engine.
//!
//! Combines coverage, quality, liquidity and stability into one ranked report.

use crate::{
    coverage::Coverage,
    liquidity::LiquidityStats,
    provider::{load_providers, ProviderData},
    quality::QualityStats,
    scoring::ProviderScore,
    stability::StabilityStats,
};
use fx_core::{config::ProviderConfig, Error, Result};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use std::path::Path;

/// Everything measured for one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    pub provider: String,
    pub coverage: Coverage,
    pub quality: QualityStats,
    pub liquidity: LiquidityStats,
    pub stability: StabilityStats,
    pub score: ProviderScore,
}

/// Ranked evaluation of all providers.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Providers from best to worst.
    pub providers: Vec<ProviderReport>,
    /// Name of the selected provider.
    pub best_provider: String,
}

impl EvaluationReport {
    /// Report of the selected provider.
    pub fn best(&self) -> Option<&ProviderReport> {
        self.providers
            .iter()
            .find(|p| p.provider == self.best_provider)
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} {:>10} {:>6} {:>12} {:>14} {:>8} {:>8} {:>14}",
            "provider", "ticks", "pairs", "avg_spread", "avg_volume", "issues", "outliers", "final_score"
        )?;
        for p in &self.providers {
            writeln!(
                f,
                "{:<10} {:>10} {:>6} {:>12} {:>14} {:>8} {:>8} {:>14}",
                p.provider,
                p.coverage.ticks,
                p.coverage.currency_pairs,
                opt(p.liquidity.avg_spread, 6),
                opt(p.liquidity.avg_volume, 1),
                p.score.penalty,
                p.stability.outliers,
                opt(p.score.final_score, 4),
            )?;
        }
        write!(f, "The best data provider is {}.", self.best_provider)
    }
}

/// Provider evaluation engine.
pub struct ProviderEvaluator {
    config: ProviderConfig,
}

impl ProviderEvaluator {
    /// Create a new evaluator from configuration.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Measure a single provider.
    pub fn evaluate_provider(&self, data: &ProviderData) -> ProviderReport {
        let coverage = Coverage::compute(&data.table);
        let quality = QualityStats::compute(&data.table);
        let liquidity = LiquidityStats::compute(&data.table);
        let stability = StabilityStats::compute(&data.table, self.config.outlier_quantile);
        let score = ProviderScore::compute(&liquidity, &quality, &self.config.scoring);

        tracing::debug!(
            provider = %data.name,
            ticks = coverage.ticks,
            issues = score.penalty,
            outliers = stability.outliers,
            final_score = ?score.final_score,
            "evaluated provider"
        );

        ProviderReport {
            provider: data.name.clone(),
            coverage,
            quality,
            liquidity,
            stability,
            score,
        }
    }

    /// Rank providers and select the best.
    ///
    /// Higher final score ranks first; providers without a score rank last and
    /// are never selected. Equal scores are ordered by name.
    pub fn evaluate(&self, providers: &[ProviderData]) -> Result<EvaluationReport> {
        let mut reports: Vec<ProviderReport> = providers
            .iter()
            .map(|p| self.evaluate_provider(p))
            .collect();

        reports.sort_by(|a, b| {
            let key = |r: &ProviderReport| Reverse(r.score.final_score.map(OrderedFloat));
            key(a).cmp(&key(b)).then_with(|| a.provider.cmp(&b.provider))
        });

        let best_provider = reports
            .first()
            .filter(|r| r.score.final_score.is_some())
            .map(|r| r.provider.clone())
            .ok_or_else(|| Error::data_availability("no provider has a computable score"))?;

        tracing::info!(best = %best_provider, providers = reports.len(), "selected provider");
        Ok(EvaluationReport {
            providers: reports,
            best_provider,
        })
    }

    /// Load every provider file from the configured directory and evaluate.
    pub fn run(&self) -> Result<EvaluationReport> {
        let dir = self.config.input_dir()?;
        let providers = load_providers(dir, &self.config.file_suffix)?;
        self.evaluate(&providers)
    }
}
