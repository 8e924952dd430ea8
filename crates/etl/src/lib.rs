//! Tick-to-bar pipeline for the fx-bars system.
//!
//! This crate provides:
//! - Extract: locate and read the tick file for a trading date
//! - Transform: schema check, quote extraction and bar building
//! - Load: date-partitioned, all-or-nothing bar persistence

pub mod pipeline;

pub use pipeline::{extract, load, transform, EtlPipeline, EtlSummary, Transformed};
