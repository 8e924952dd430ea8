//! Spread and volume statistics.

use fx_ingestion::TickTable;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Spread and volume summary for one provider.
///
/// Standard deviations are sample (n - 1) estimates. A statistic that cannot be
/// computed from the available values is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidityStats {
    pub avg_spread: Option<f64>,
    pub spread_std: Option<f64>,
    pub avg_volume: Option<f64>,
    pub volume_std: Option<f64>,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn mean_and_std(values: &[f64]) -> (Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None);
    }
    (finite(values.mean()), finite(values.std_dev()))
}

impl LiquidityStats {
    /// Compute spread and volume statistics over rows where the values exist.
    pub fn compute(table: &TickTable) -> Self {
        let spreads: Vec<f64> = table.rows().iter().filter_map(|r| r.spread()).collect();
        let volumes: Vec<f64> = table.rows().iter().filter_map(|r| r.volume).collect();

        let (avg_spread, spread_std) = mean_and_std(&spreads);
        let (avg_volume, volume_std) = mean_and_std(&volumes);

        Self {
            avg_spread,
            spread_std,
            avg_volume,
            volume_std,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spread_and_volume() {
        let csv = "\
datetime,currency_pair,bid,ask,volume
2024-03-01 09:00:00,EURUSD,1.0000,1.0002,100
2024-03-01 09:00:01,EURUSD,1.0000,1.0004,300
2024-03-01 09:00:02,EURUSD,,1.0004,200
";
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        let stats = LiquidityStats::compute(&table);

        // Spreads 0.0002 and 0.0004; volumes 100, 300, 200.
        assert_relative_eq!(stats.avg_spread.unwrap(), 0.0003, epsilon = 1e-12);
        assert_relative_eq!(stats.spread_std.unwrap(), 0.0002_f64.sqrt() * 0.01, epsilon = 1e-12);
        assert_relative_eq!(stats.avg_volume.unwrap(), 200.0, epsilon = 1e-12);
        assert_relative_eq!(stats.volume_std.unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_row_has_no_std() {
        let csv = "datetime,currency_pair,bid,ask,volume\n2024-03-01 09:00:00,EURUSD,1.0,1.1,5\n";
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        let stats = LiquidityStats::compute(&table);

        assert!(stats.avg_spread.is_some());
        assert!(stats.spread_std.is_none());
        assert_eq!(stats.avg_volume, Some(5.0));
    }

    #[test]
    fn test_no_volume_values() {
        let csv = "datetime,currency_pair,bid,ask,volume\n2024-03-01 09:00:00,EURUSD,1.0,1.1,\n";
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        let stats = LiquidityStats::compute(&table);
        assert!(stats.avg_volume.is_none());
        assert!(stats.volume_std.is_none());
    }
}
