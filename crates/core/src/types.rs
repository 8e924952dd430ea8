//! Core data types for the fx-bars system.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const NANOS_PER_SEC: i128 = 1_000_000_000;
const NANOS_PER_DAY: i128 = 86_400 * NANOS_PER_SEC;

/// A single top-of-book FX quote as read from a tick file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Wall-clock timestamp of the quote.
    pub ts: NaiveDateTime,
    /// Compact instrument code (e.g., "EURUSD").
    pub instrument: String,
    /// Bid price.
    pub bid: f64,
    /// Ask price.
    pub ask: f64,
}

impl Quote {
    /// Calculate mid price.
    #[inline]
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Calculate spread.
    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Trading date of the quote.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.ts.date()
    }
}

/// Currency pair in slash-delimited form (e.g., "EUR/USD").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyPair(String);

impl CurrencyPair {
    /// Length of a compact pair code ("EURUSD").
    pub const COMPACT_LEN: usize = 6;

    /// Normalize a compact 6-character code into base/quote form.
    ///
    /// "EURUSD" becomes "EUR/USD". Any other length is rejected.
    pub fn from_compact(code: &str) -> Result<Self> {
        let len = code.chars().count();
        if len != Self::COMPACT_LEN {
            return Err(Error::validation(format!(
                "currency pair '{code}' must be exactly {} characters, got {len}",
                Self::COMPACT_LEN
            )));
        }

        // Char boundary of the third character.
        let split = code
            .char_indices()
            .nth(3)
            .map(|(i, _)| i)
            .unwrap_or(code.len());
        let (base, quote) = code.split_at(split);
        Ok(Self(format!("{base}/{quote}")))
    }

    /// Base currency (left leg).
    pub fn base(&self) -> &str {
        self.0.split_once('/').map(|(b, _)| b).unwrap_or(&self.0)
    }

    /// Quote currency (right leg).
    pub fn quote(&self) -> &str {
        self.0.split_once('/').map(|(_, q)| q).unwrap_or("")
    }

    /// Normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// OHLC bar of mid prices for one currency pair and one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Normalized currency pair.
    pub currency_pair: CurrencyPair,
    /// Bucket start (timestamp truncated to the bar interval).
    pub timestamp: NaiveDateTime,
    /// Mid of the first quote in the bucket.
    pub open: f64,
    /// Highest mid in the bucket.
    pub high: f64,
    /// Lowest mid in the bucket.
    pub low: f64,
    /// Mid of the last quote in the bucket.
    pub close: f64,
}

impl Bar {
    /// Check the OHLC ordering invariant.
    pub fn is_consistent(&self) -> bool {
        self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
    }
}

/// Fixed, non-overlapping bar width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BarInterval(TimeDelta);

impl BarInterval {
    /// Create an interval.
    ///
    /// The width must be positive and divide 24 hours evenly, so every bucket
    /// of a trading date starts on that date.
    pub fn new(width: TimeDelta) -> Result<Self> {
        if width <= TimeDelta::zero() {
            return Err(Error::config(format!(
                "bar interval must be positive, got {width}"
            )));
        }
        let interval = Self(width);
        if NANOS_PER_DAY % interval.width_nanos() != 0 {
            return Err(Error::config(format!(
                "bar interval {interval} does not divide a day evenly"
            )));
        }
        Ok(interval)
    }

    /// One-minute bars.
    pub fn one_minute() -> Self {
        Self(TimeDelta::minutes(1))
    }

    /// Interval width.
    pub fn width(&self) -> TimeDelta {
        self.0
    }

    /// Truncate a timestamp to the start of its enclosing interval.
    ///
    /// Buckets are aligned to the Unix epoch, which is midnight of every date
    /// because the width divides a day. Truncation always moves toward the
    /// past, including for timestamps before the epoch.
    pub fn floor(&self, ts: NaiveDateTime) -> Result<NaiveDateTime> {
        let utc = ts.and_utc();
        let total = utc.timestamp() as i128 * NANOS_PER_SEC + utc.timestamp_subsec_nanos() as i128;
        let width = self.width_nanos();
        let floored = total - total.rem_euclid(width);

        let secs = floored.div_euclid(NANOS_PER_SEC);
        let nanos = floored.rem_euclid(NANOS_PER_SEC);
        i64::try_from(secs)
            .ok()
            .and_then(|s| DateTime::from_timestamp(s, nanos as u32))
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::validation(format!("timestamp {ts} out of range for bucketing")))
    }

    fn width_nanos(&self) -> i128 {
        let secs = self.0.num_seconds() as i128;
        secs * NANOS_PER_SEC + self.0.subsec_nanos() as i128
    }
}

impl Default for BarInterval {
    fn default() -> Self {
        Self::one_minute()
    }
}

impl FromStr for BarInterval {
    type Err = Error;

    /// Parse forms like "1min", "5min", "30s", "250ms", "1h".
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| Error::config(format!("bar interval '{s}' is missing a unit")))?;
        let (count, unit) = s.split_at(split);
        let count: i64 = count
            .parse()
            .map_err(|_| Error::config(format!("bar interval '{s}' has no count")))?;

        let width = match unit {
            "ms" => TimeDelta::try_milliseconds(count),
            "s" | "sec" => TimeDelta::try_seconds(count),
            "m" | "min" => TimeDelta::try_minutes(count),
            "h" => TimeDelta::try_hours(count),
            other => {
                return Err(Error::config(format!(
                    "bar interval '{s}' has unknown unit '{other}'"
                )))
            }
        }
        .ok_or_else(|| Error::config(format!("bar interval '{s}' is out of range")))?;

        Self::new(width)
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0.num_milliseconds();
        if ms % 3_600_000 == 0 {
            write!(f, "{}h", ms / 3_600_000)
        } else if ms % 60_000 == 0 {
            write!(f, "{}min", ms / 60_000)
        } else if ms % 1_000 == 0 {
            write!(f, "{}s", ms / 1_000)
        } else {
            write!(f, "{ms}ms")
        }
    }
}

impl TryFrom<String> for BarInterval {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BarInterval> for String {
    fn from(value: BarInterval) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_quote_mid() {
        let quote = Quote {
            ts: ts("2024-03-01 09:00:00.200"),
            instrument: "EURUSD".to_string(),
            bid: 1.1000,
            ask: 1.1002,
        };
        assert_eq!(quote.mid(), (1.1000 + 1.1002) / 2.0);
        assert!((quote.spread() - 0.0002).abs() < 1e-12);
    }

    #[test]
    fn test_pair_normalization() {
        let pair = CurrencyPair::from_compact("EURUSD").unwrap();
        assert_eq!(pair.as_str(), "EUR/USD");
        assert_eq!(pair.base(), "EUR");
        assert_eq!(pair.quote(), "USD");
    }

    #[test]
    fn test_pair_wrong_length_rejected() {
        assert!(matches!(
            CurrencyPair::from_compact("EURUS"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            CurrencyPair::from_compact("EUR/USD"),
            Err(Error::Validation(_))
        ));
        assert!(CurrencyPair::from_compact("").is_err());
    }

    #[test]
    fn test_floor_truncates_not_rounds() {
        let interval = BarInterval::one_minute();
        assert_eq!(
            interval.floor(ts("2024-03-01 09:00:59.999")).unwrap(),
            ts("2024-03-01 09:00:00")
        );
        assert_eq!(
            interval.floor(ts("2024-03-01 09:01:00.000")).unwrap(),
            ts("2024-03-01 09:01:00")
        );
    }

    #[test]
    fn test_floor_before_epoch() {
        let interval = BarInterval::one_minute();
        assert_eq!(
            interval.floor(ts("1969-12-31 23:59:30.5")).unwrap(),
            ts("1969-12-31 23:59:00")
        );
    }

    #[test]
    fn test_floor_five_minutes() {
        let interval: BarInterval = "5min".parse().unwrap();
        assert_eq!(
            interval.floor(ts("2024-03-01 09:14:10")).unwrap(),
            ts("2024-03-01 09:10:00")
        );
    }

    #[test]
    fn test_interval_parse_and_display() {
        assert_eq!("1min".parse::<BarInterval>().unwrap(), BarInterval::one_minute());
        assert_eq!("30s".parse::<BarInterval>().unwrap().to_string(), "30s");
        assert_eq!("1h".parse::<BarInterval>().unwrap().to_string(), "1h");
        assert_eq!("250ms".parse::<BarInterval>().unwrap().to_string(), "250ms");
        assert!("0min".parse::<BarInterval>().is_err());
        assert!("min".parse::<BarInterval>().is_err());
        assert!("5".parse::<BarInterval>().is_err());
        assert!("5d".parse::<BarInterval>().is_err());
    }

    #[test]
    fn test_interval_must_divide_a_day() {
        for ok in ["1min", "5min", "15min", "1h", "24h", "45s", "250ms"] {
            assert!(ok.parse::<BarInterval>().is_ok(), "{ok} should be accepted");
        }
        for bad in ["7min", "11s", "5h", "48h", "700ms"] {
            let err = bad.parse::<BarInterval>().unwrap_err();
            assert!(
                matches!(err, Error::Config(ref msg) if msg.contains("does not divide a day")),
                "{bad}: {err}"
            );
        }
        assert!(BarInterval::new(TimeDelta::minutes(7)).is_err());
    }

    #[test]
    fn test_floor_stays_on_date() {
        let interval: BarInterval = "90min".parse().unwrap();
        assert_eq!(
            interval.floor(ts("2024-03-01 00:01:00")).unwrap(),
            ts("2024-03-01 00:00:00")
        );
    }

    #[test]
    fn test_bar_consistency() {
        let bar = Bar {
            currency_pair: CurrencyPair::from_compact("GBPUSD").unwrap(),
            timestamp: ts("2024-03-01 09:00:00"),
            open: 1.2,
            high: 1.3,
            low: 1.1,
            close: 1.25,
        };
        assert!(bar.is_consistent());
        assert!(!Bar { high: 1.15, ..bar }.is_consistent());
    }
}
