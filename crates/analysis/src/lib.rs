//! Tick data provider evaluation for the fx-bars system.
//!
//! This crate handles:
//! - Loading one tick file per provider
//! - Coverage (tick counts, pairs, time span)
//! - Data quality (missing cells, duplicate rows, crossed quotes)
//! - Spread and volume statistics
//! - Price stability (extreme mid-price jumps)
//! - Composite scoring and provider selection

pub mod coverage;
pub mod evaluator;
pub mod liquidity;
pub mod provider;
pub mod quality;
pub mod scoring;
pub mod stability;

pub use coverage::Coverage;
pub use evaluator::{EvaluationReport, ProviderEvaluator, ProviderReport};
pub use liquidity::LiquidityStats;
pub use provider::{load_providers, provider_name, ProviderData};
pub use quality::QualityStats;
pub use scoring::ProviderScore;
pub use stability::StabilityStats;
