//! Data ingestion and bar construction for the fx-bars system.
//!
//! This crate handles:
//! - Reading gzip-compressed tick tables
//! - Column presence checks and quote extraction
//! - OHLC bar building from mid prices
//! - Writing bar tables atomically

pub mod bar_builder;
pub mod reader;
pub mod writer;

pub use bar_builder::BarBuilder;
pub use reader::{parse_timestamp, QuoteBatch, TickRow, TickTable};
pub use writer::{write_bars, write_bars_to};
