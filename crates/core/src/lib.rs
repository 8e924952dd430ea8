//! Core types and configuration for the fx-bars system.
//!
//! This crate provides shared types used across all other crates:
//! - Market data types (quotes, currency pairs, OHLC bars)
//! - Bar interval handling and timestamp truncation
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
