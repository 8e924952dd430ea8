//! OHLC bar building from quotes.
//!
//! Builds one mid-price OHLC bar per (currency pair, time bucket) for a single
//! trading date. Buckets come from the data; an interval with no quotes has no
//! bar.

use chrono::{NaiveDate, NaiveDateTime};
use fx_core::{Bar, BarInterval, CurrencyPair, Error, Quote, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Builder for OHLC bars over one trading date.
#[derive(Debug, Clone)]
pub struct BarBuilder {
    /// Only quotes on this date are kept.
    target_date: NaiveDate,
    /// Bar width.
    interval: BarInterval,
}

/// A quote tagged with its normalized pair and bucket.
#[derive(Debug)]
struct BucketedQuote {
    pair: CurrencyPair,
    bucket: NaiveDateTime,
    ts: NaiveDateTime,
    mid: f64,
}

impl BucketedQuote {
    fn sort_key_cmp(&self, other: &Self) -> Ordering {
        self.pair
            .cmp(&other.pair)
            .then(self.bucket.cmp(&other.bucket))
            .then(self.ts.cmp(&other.ts))
    }
}

/// A bar that's currently being built.
#[derive(Debug, Clone)]
struct BarInProgress {
    currency_pair: CurrencyPair,
    timestamp: NaiveDateTime,
    open: Option<f64>,
    high: f64,
    low: f64,
    close: f64,
}

impl BarInProgress {
    fn new(currency_pair: CurrencyPair, timestamp: NaiveDateTime) -> Self {
        Self {
            currency_pair,
            timestamp,
            open: None,
            high: f64::NEG_INFINITY,
            low: f64::INFINITY,
            close: 0.0,
        }
    }

    fn add_mid(&mut self, mid: f64) {
        if self.open.is_none() {
            self.open = Some(mid);
        }
        self.high = self.high.max(mid);
        self.low = self.low.min(mid);
        self.close = mid;
    }

    fn matches(&self, quote: &BucketedQuote) -> bool {
        self.currency_pair == quote.pair && self.timestamp == quote.bucket
    }

    fn into_bar(self) -> Option<Bar> {
        let open = self.open?;
        Some(Bar {
            currency_pair: self.currency_pair,
            timestamp: self.timestamp,
            open,
            high: self.high,
            low: self.low,
            close: self.close,
        })
    }
}

impl BarBuilder {
    /// Create a new bar builder.
    pub fn new(target_date: NaiveDate, interval: BarInterval) -> Self {
        Self {
            target_date,
            interval,
        }
    }

    /// Create a builder producing one-minute bars.
    pub fn one_minute(target_date: NaiveDate) -> Self {
        Self::new(target_date, BarInterval::one_minute())
    }

    /// Trading date being built.
    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    /// Bar width.
    pub fn interval(&self) -> BarInterval {
        self.interval
    }

    /// Quotes falling on the target date, in input order.
    pub fn filter_to_date<'a>(&self, quotes: &'a [Quote]) -> Vec<&'a Quote> {
        quotes
            .iter()
            .filter(|q| q.date() == self.target_date)
            .collect()
    }

    /// Build bars for the target date.
    ///
    /// Output is ordered by pair, then bucket start. Within a bucket quotes are
    /// ordered by timestamp with ties kept in input order, which decides the
    /// open and close. Fails without output when no quote falls on the date or
    /// when a pair code on the date cannot be normalized.
    pub fn build(&self, quotes: &[Quote]) -> Result<Vec<Bar>> {
        self.build_counted(quotes).map(|(bars, _)| bars)
    }

    /// Same as [`build`](Self::build), also returning the number of quotes on
    /// the target date.
    pub fn build_counted(&self, quotes: &[Quote]) -> Result<(Vec<Bar>, usize)> {
        let on_date = self.filter_to_date(quotes);
        if on_date.is_empty() {
            return Err(Error::data_availability(format!(
                "No data found for expected trading date {}",
                self.target_date
            )));
        }

        let mut bucketed = self.bucket_quotes(&on_date)?;

        // Stable: equal timestamps keep input order.
        bucketed.sort_by(BucketedQuote::sort_key_cmp);

        let bars = Self::aggregate(bucketed);
        tracing::debug!(
            date = %self.target_date,
            interval = %self.interval,
            quotes = on_date.len(),
            bars = bars.len(),
            "built bars"
        );
        Ok((bars, on_date.len()))
    }

    fn bucket_quotes(&self, quotes: &[&Quote]) -> Result<Vec<BucketedQuote>> {
        let mut pairs: HashMap<&str, CurrencyPair> = HashMap::new();
        let mut bucketed = Vec::with_capacity(quotes.len());

        for quote in quotes {
            let pair = match pairs.get(quote.instrument.as_str()) {
                Some(pair) => pair.clone(),
                None => {
                    let pair = CurrencyPair::from_compact(&quote.instrument)?;
                    pairs.insert(quote.instrument.as_str(), pair.clone());
                    pair
                }
            };

            bucketed.push(BucketedQuote {
                pair,
                bucket: self.interval.floor(quote.ts)?,
                ts: quote.ts,
                mid: quote.mid(),
            });
        }

        Ok(bucketed)
    }

    /// Reduce sorted quotes into bars, one per run of equal (pair, bucket).
    fn aggregate(sorted: Vec<BucketedQuote>) -> Vec<Bar> {
        let mut bars = Vec::new();
        let mut current: Option<BarInProgress> = None;

        for quote in sorted {
            if let Some(bar) = current.as_mut() {
                if bar.matches(&quote) {
                    bar.add_mid(quote.mid);
                    continue;
                }
            }

            if let Some(done) = current.take().and_then(BarInProgress::into_bar) {
                bars.push(done);
            }
            let mut bar = BarInProgress::new(quote.pair, quote.bucket);
            bar.add_mid(quote.mid);
            current = Some(bar);
        }

        if let Some(done) = current.and_then(BarInProgress::into_bar) {
            bars.push(done);
        }
        bars
    }
}
