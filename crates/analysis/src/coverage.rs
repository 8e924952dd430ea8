//! Dataset coverage per provider.

use chrono::NaiveDateTime;
use fx_ingestion::TickTable;
use serde::Serialize;
use std::collections::HashSet;

/// How much data a provider delivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coverage {
    /// Rows with a timestamp.
    pub ticks: usize,
    /// Distinct currency pair codes.
    pub currency_pairs: usize,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

impl Coverage {
    /// Compute coverage for one provider table.
    pub fn compute(table: &TickTable) -> Self {
        let timestamps = table.rows().iter().filter_map(|r| r.datetime);
        let pairs: HashSet<&str> = table
            .rows()
            .iter()
            .filter_map(|r| r.currency_pair.as_deref())
            .collect();

        let mut ticks = 0;
        let mut start_time: Option<NaiveDateTime> = None;
        let mut end_time: Option<NaiveDateTime> = None;
        for ts in timestamps {
            ticks += 1;
            start_time = Some(start_time.map_or(ts, |s| s.min(ts)));
            end_time = Some(end_time.map_or(ts, |e| e.max(ts)));
        }

        Self {
            ticks,
            currency_pairs: pairs.len(),
            start_time,
            end_time,
        }
    }
}
