//! Data quality checks per provider.

use chrono::NaiveDateTime;
use fx_ingestion::{TickRow, TickTable};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::HashSet;

/// Data quality issue counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityStats {
    /// Empty cells across all columns.
    pub missing_values: usize,
    /// Rows identical to an earlier row.
    pub duplicate_rows: usize,
    /// Quotes with bid at or above ask.
    pub invalid_bid_ask: usize,
}

impl QualityStats {
    /// Total issue count, used as the scoring penalty.
    pub fn total_issues(&self) -> usize {
        self.missing_values + self.duplicate_rows + self.invalid_bid_ask
    }

    /// Compute quality stats for one provider table.
    pub fn compute(table: &TickTable) -> Self {
        let mut stats = Self::default();
        let mut seen: HashSet<RowKey<'_>> = HashSet::with_capacity(table.len());

        for row in table.rows() {
            stats.missing_values += row.missing_cells(table);

            if !seen.insert(RowKey::new(row)) {
                stats.duplicate_rows += 1;
            }

            if let (Some(bid), Some(ask)) = (row.bid, row.ask) {
                if bid >= ask {
                    stats.invalid_bid_ask += 1;
                }
            }
        }

        stats
    }
}

/// Hashable view of every cell in a row (line number excluded).
#[derive(Debug, PartialEq, Eq, Hash)]
struct RowKey<'a> {
    datetime: Option<NaiveDateTime>,
    currency_pair: Option<&'a str>,
    bid: Option<OrderedFloat<f64>>,
    ask: Option<OrderedFloat<f64>>,
    volume: Option<OrderedFloat<f64>>,
    extra: &'a [String],
}

impl<'a> RowKey<'a> {
    fn new(row: &'a TickRow) -> Self {
        Self {
            datetime: row.datetime,
            currency_pair: row.currency_pair.as_deref(),
            bid: row.bid.map(OrderedFloat),
            ask: row.ask.map(OrderedFloat),
            volume: row.volume.map(OrderedFloat),
            extra: &row.extra,
        }
    }
}
