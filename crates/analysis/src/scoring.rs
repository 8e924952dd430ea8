//! Composite provider score.

use crate::liquidity::LiquidityStats;
use crate::quality::QualityStats;
use fx_core::config::ScoringWeights;
use serde::Serialize;

/// Score components and final composite.
///
/// `final_score = spread * spread_score + volume * volume_score - penalty * penalty_count`
/// where the multipliers come from [`ScoringWeights`]. Tighter spreads and
/// higher volume score better; every data quality issue costs a fixed amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderScore {
    /// Inverse of the average spread.
    pub spread_score: Option<f64>,
    /// Average volume.
    pub volume_score: Option<f64>,
    /// Total data quality issues.
    pub penalty: usize,
    /// `None` when a component is unavailable.
    pub final_score: Option<f64>,
}

impl ProviderScore {
    /// Score a provider from its liquidity and quality stats.
    pub fn compute(
        liquidity: &LiquidityStats,
        quality: &QualityStats,
        weights: &ScoringWeights,
    ) -> Self {
        let spread_score = liquidity.avg_spread.map(|s| 1.0 / s);
        let volume_score = liquidity.avg_volume;
        let penalty = quality.total_issues();

        let final_score = match (spread_score, volume_score) {
            (Some(spread), Some(volume)) => {
                let score = weights.spread * spread + weights.volume * volume
                    - weights.penalty * penalty as f64;
                (!score.is_nan()).then_some(score)
            }
            _ => None,
        };

        Self {
            spread_score,
            volume_score,
            penalty,
            final_score,
        }
    }
}
