//! Price stability: counting extreme mid-price jumps.

use chrono::NaiveDateTime;
use fx_ingestion::TickTable;
use serde::Serialize;
use std::collections::BTreeMap;

/// Extreme-move summary for one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityStats {
    /// Absolute tick-to-tick returns considered.
    pub returns: usize,
    /// Quantile threshold on absolute returns.
    pub threshold: Option<f64>,
    /// Returns strictly above the threshold.
    pub outliers: usize,
}

/// Linear-interpolation quantile of sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Absolute percentage changes of mid price between consecutive ticks of each pair.
///
/// Ticks are ordered by timestamp within a pair (ties keep file order), with
/// undated ticks last in file order. A change involving a missing mid, or a
/// zero previous mid, yields no return.
pub fn absolute_returns(table: &TickTable) -> Vec<f64> {
    let mut by_pair: BTreeMap<&str, Vec<(Option<NaiveDateTime>, Option<f64>)>> = BTreeMap::new();
    for row in table.rows() {
        if let Some(pair) = row.currency_pair.as_deref() {
            by_pair.entry(pair).or_default().push((row.datetime, row.mid()));
        }
    }

    let mut returns = Vec::new();
    for ticks in by_pair.values_mut() {
        ticks.sort_by_key(|(ts, _)| (ts.is_none(), *ts));
        for window in ticks.windows(2) {
            if let (Some(prev), Some(cur)) = (window[0].1, window[1].1) {
                let ret = (cur / prev - 1.0).abs();
                if ret.is_finite() {
                    returns.push(ret);
                }
            }
        }
    }
    returns
}

impl StabilityStats {
    /// Count returns above the `q` quantile of the provider's own returns.
    pub fn compute(table: &TickTable, q: f64) -> Self {
        let mut returns = absolute_returns(table);
        returns.sort_by(f64::total_cmp);

        let threshold = quantile(&returns, q);
        let outliers = threshold
            .map(|t| returns.iter().filter(|&&r| r > t).count())
            .unwrap_or(0);

        Self {
            returns: returns.len(),
            threshold,
            outliers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert_relative_eq!(quantile(&values, 0.5).unwrap(), 2.5);
        assert_relative_eq!(quantile(&values, 0.999).unwrap(), 3.997, epsilon = 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.999), Some(7.0));
    }

    #[test]
    fn test_returns_per_pair_in_time_order() {
        let csv = "\
datetime,currency_pair,bid,ask,volume
2024-03-01 09:00:02,EURUSD,1.21,1.21,1
2024-03-01 09:00:00,EURUSD,1.00,1.00,1
2024-03-01 09:00:01,EURUSD,1.10,1.10,1
2024-03-01 09:00:00,USDJPY,150.0,150.0,1
2024-03-01 09:00:03,USDJPY,,150.0,1
2024-03-01 09:00:04,USDJPY,150.0,150.0,1
";
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        let returns = absolute_returns(&table);

        // EURUSD: 1.00 -> 1.10 -> 1.21; USDJPY breaks on the missing bid.
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(returns[1], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_undated_ticks_follow_dated_ones() {
        let csv = "\
datetime,currency_pair,bid,ask,volume
,EURUSD,2.00,2.00,1
2024-03-01 09:00:01,EURUSD,1.10,1.10,1
,EURUSD,1.00,1.00,1
2024-03-01 09:00:00,EURUSD,1.00,1.00,1
";
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        let returns = absolute_returns(&table);

        // 1.00 -> 1.10 -> 2.00 (undated) -> 1.00 (undated)
        assert_eq!(returns.len(), 3);
        assert_relative_eq!(returns[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(returns[1], 2.0 / 1.1 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(returns[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_outlier_count() {
        let mut csv = String::from("datetime,currency_pair,bid,ask,volume\n");
        let mut price = 1.0;
        for i in 0..100 {
            // one large jump, everything else flat-ish
            price *= if i == 50 { 1.05 } else { 1.0001 };
            csv.push_str(&format!("2024-03-01 09:{:02}:{:02},EURUSD,{price},{price},1\n", i / 60, i % 60));
        }
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        let stats = StabilityStats::compute(&table, 0.9);

        assert_eq!(stats.returns, 99);
        assert!(stats.outliers >= 1);
        assert!(stats.outliers <= 10);
        assert!(stats.threshold.unwrap() < 0.05);
    }

    #[test]
    fn test_no_returns() {
        let table = TickTable::from_reader("datetime,currency_pair,bid,ask,volume\n".as_bytes()).unwrap();
        let stats = StabilityStats::compute(&table, 0.999);
        assert_eq!(stats.outliers, 0);
        assert!(stats.threshold.is_none());
    }
}
