//! Tick table reading.
//!
//! Reads a delimited tick table (gzip-compressed when the file name ends in
//! `.gz`) into a [`TickTable`]. Known columns are parsed eagerly, empty cells
//! are kept as missing, and anything else that fails to parse is rejected with
//! the line and column that caused it.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use flate2::read::MultiGzDecoder;
use fx_core::{Error, Quote, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Timestamp column.
pub const DATETIME: &str = "datetime";
/// Compact currency pair column.
pub const CURRENCY_PAIR: &str = "currency_pair";
/// Bid price column.
pub const BID: &str = "bid";
/// Ask price column.
pub const ASK: &str = "ask";
/// Traded volume column (optional for bar building).
pub const VOLUME: &str = "volume";

/// Columns a quote table must carry.
pub const QUOTE_COLUMNS: [&str; 4] = [DATETIME, CURRENCY_PAIR, BID, ASK];

/// Cell values treated as missing, the usual dataframe NA markers.
const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse an ISO-style timestamp.
///
/// Offsets are accepted but the local wall-clock time is kept. A bare date
/// parses as midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Some(ts.naive_local());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// One row of a tick table.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRow {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    /// Quote timestamp (wall clock).
    pub datetime: Option<NaiveDateTime>,
    /// Compact instrument code as written in the file.
    pub currency_pair: Option<String>,
    /// Bid price.
    pub bid: Option<f64>,
    /// Ask price.
    pub ask: Option<f64>,
    /// Traded volume; an unparseable cell reads as missing.
    pub volume: Option<f64>,
    /// Raw cells of columns not listed above, in header order.
    pub extra: Vec<String>,
}

impl TickRow {
    /// Mid price, when both sides are present.
    pub fn mid(&self) -> Option<f64> {
        Some((self.bid? + self.ask?) / 2.0)
    }

    /// Spread, when both sides are present.
    pub fn spread(&self) -> Option<f64> {
        Some(self.ask? - self.bid?)
    }

    /// Number of missing cells among the columns present in `table`.
    pub fn missing_cells(&self, table: &TickTable) -> usize {
        let known = [
            (DATETIME, self.datetime.is_none()),
            (CURRENCY_PAIR, self.currency_pair.is_none()),
            (BID, self.bid.is_none()),
            (ASK, self.ask.is_none()),
            (VOLUME, self.volume.is_none()),
        ];
        let known_missing = known
            .iter()
            .filter(|(col, missing)| *missing && table.has_column(col))
            .count();
        known_missing + self.extra.iter().filter(|c| is_missing(c)).count()
    }

    fn to_quote(&self) -> Option<Quote> {
        Some(Quote {
            ts: self.datetime?,
            instrument: self.currency_pair.clone()?,
            bid: self.bid?,
            ask: self.ask?,
        })
    }
}

/// Quotes extracted from a tick table.
#[derive(Debug, Clone, Default)]
pub struct QuoteBatch {
    /// Complete quotes in input order.
    pub quotes: Vec<Quote>,
    /// Rows skipped because a required value was missing.
    pub skipped: usize,
}

/// An in-memory tick table.
#[derive(Debug, Clone, Default)]
pub struct TickTable {
    columns: Vec<String>,
    rows: Vec<TickRow>,
}

/// Header positions of the known columns.
#[derive(Debug, Default)]
struct ColumnIndex {
    datetime: Option<usize>,
    currency_pair: Option<usize>,
    bid: Option<usize>,
    ask: Option<usize>,
    volume: Option<usize>,
    extra: Vec<usize>,
}

impl ColumnIndex {
    fn new(columns: &[String]) -> Self {
        let mut index = Self::default();
        for (i, name) in columns.iter().enumerate() {
            match name.as_str() {
                DATETIME => index.datetime = Some(i),
                CURRENCY_PAIR => index.currency_pair = Some(i),
                BID => index.bid = Some(i),
                ASK => index.ask = Some(i),
                VOLUME => index.volume = Some(i),
                _ => index.extra.push(i),
            }
        }
        index
    }
}

impl TickTable {
    /// Read a tick table from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::missing_input(path));
        }

        let file = File::open(path)?;
        let gzipped = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        let table = if gzipped {
            Self::from_reader(MultiGzDecoder::new(BufReader::new(file)))?
        } else {
            Self::from_reader(BufReader::new(file))?
        };

        tracing::debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.columns.len(),
            "read tick table"
        );
        Ok(table)
    }

    /// Read a tick table from an uncompressed CSV stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let index = ColumnIndex::new(&columns);

        let mut rows = Vec::new();
        let mut bad_volumes = 0usize;
        for (idx, record) in reader.records().enumerate() {
            // records() starts after the header line
            let line = idx + 2;
            let record = record?;
            let cell = |pos: Option<usize>| {
                pos.and_then(|p| record.get(p))
                    .filter(|c| !is_missing(c))
            };

            // Volume is informational: an unparseable cell reads as missing.
            let raw_volume = cell(index.volume);
            let volume = raw_volume.and_then(|c| parse_price(line, VOLUME, c).ok());
            if raw_volume.is_some() && volume.is_none() {
                bad_volumes += 1;
            }

            rows.push(TickRow {
                line,
                datetime: cell(index.datetime)
                    .map(|c| {
                        parse_timestamp(c).ok_or_else(|| invalid_cell(line, DATETIME, c, "timestamp"))
                    })
                    .transpose()?,
                currency_pair: cell(index.currency_pair).map(str::to_string),
                bid: cell(index.bid).map(|c| parse_price(line, BID, c)).transpose()?,
                ask: cell(index.ask).map(|c| parse_price(line, ASK, c)).transpose()?,
                volume,
                extra: index
                    .extra
                    .iter()
                    .map(|&p| record.get(p).unwrap_or("").to_string())
                    .collect(),
            });
        }

        if bad_volumes > 0 {
            tracing::warn!(rows = bad_volumes, "unparseable volume cells read as missing");
        }

        Ok(Self { columns, rows })
    }

    /// Column names in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in input order.
    pub fn rows(&self) -> &[TickRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the header carries `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Fail with a schema error naming every absent column.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: BTreeSet<&str> = required
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            let names: Vec<&str> = missing.into_iter().collect();
            Err(Error::schema(format!(
                "Missing required columns: {}",
                names.join(", ")
            )))
        }
    }

    /// Extract complete quotes in input order.
    ///
    /// Rows lacking a timestamp, pair, bid or ask cannot form a quote and are
    /// counted as skipped.
    pub fn quotes(&self) -> QuoteBatch {
        let mut batch = QuoteBatch {
            quotes: Vec::with_capacity(self.rows.len()),
            skipped: 0,
        };

        for row in &self.rows {
            match row.to_quote() {
                Some(quote) => batch.quotes.push(quote),
                None => batch.skipped += 1,
            }
        }

        if batch.skipped > 0 {
            tracing::warn!(skipped = batch.skipped, "skipped incomplete tick rows");
        }
        batch
    }
}

fn invalid_cell(line: usize, column: &str, value: &str, expected: &str) -> Error {
    Error::validation(format!(
        "line {line}: column '{column}': cannot parse '{value}' as a {expected}"
    ))
}

fn parse_price(line: usize, column: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid_cell(line, column, value, "finite number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SAMPLE: &str = "\
datetime,currency_pair,bid,ask,volume
2024-03-01 09:00:00.200,EURUSD,1.1000,1.1002,1000000
2024-03-01 09:00:00.700,EURUSD,1.1005,1.1007,
,GBPUSD,1.2600,1.2602,500000
2024-03-01 09:01:00.100,EURUSD,,1.0992,250000
";

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(9, 0, 0, 200)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01 09:00:00.200"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T09:00:00.200"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T09:00:00.200+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 09:00:00.200+00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01"),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_read_keeps_missing_cells() {
        let table = TickTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows()[0].line, 2);
        assert_eq!(table.rows()[0].volume, Some(1_000_000.0));
        assert_eq!(table.rows()[1].volume, None);
        assert_eq!(table.rows()[2].datetime, None);
        assert_eq!(table.rows()[3].bid, None);
        assert_eq!(table.rows()[1].missing_cells(&table), 1);
    }

    #[test]
    fn test_quotes_skip_incomplete_rows() {
        let table = TickTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let batch = table.quotes();
        assert_eq!(batch.quotes.len(), 2);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.quotes[0].instrument, "EURUSD");
        assert!((batch.quotes[1].bid - 1.1005).abs() < 1e-12);
    }

    #[test]
    fn test_require_columns_lists_all_missing() {
        let table = TickTable::from_reader("datetime,bid\n".as_bytes()).unwrap();
        let err = table.require_columns(&QUOTE_COLUMNS).unwrap_err();
        match err {
            Error::Schema(msg) => assert_eq!(msg, "Missing required columns: ask, currency_pair"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(table.require_columns(&[DATETIME, BID]).is_ok());
    }

    #[test]
    fn test_unparseable_price_is_validation_error() {
        let csv = "datetime,currency_pair,bid,ask\n2024-03-01 09:00:00,EURUSD,abc,1.1\n";
        let err = TickTable::from_reader(csv.as_bytes()).unwrap_err();
        match err {
            Error::Validation(msg) => {
                assert!(msg.contains("line 2"));
                assert!(msg.contains("'bid'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dataframe_na_markers_read_as_missing() {
        let csv = "\
datetime,currency_pair,bid,ask,volume
2024-03-01 09:00:00,EURUSD,1.1000,1.1002,None
2024-03-01 09:00:01,EURUSD,NULL,1.1002,100
<NA>,#N/A,n/a,-nan,1.#QNAN
";
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].volume, None);
        assert_eq!(table.rows()[0].bid, Some(1.1000));
        assert_eq!(table.rows()[1].bid, None);
        assert_eq!(table.rows()[1].volume, Some(100.0));
        assert_eq!(table.rows()[2].missing_cells(&table), 5);
        assert_eq!(table.quotes().skipped, 2);
    }

    #[test]
    fn test_unparseable_volume_reads_as_missing() {
        let csv = "datetime,currency_pair,bid,ask,volume\n2024-03-01 09:00:00,EURUSD,1.1,1.2,lots\n";
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.rows()[0].volume, None);
        assert_eq!(table.rows()[0].missing_cells(&table), 1);
        assert_eq!(table.quotes().quotes.len(), 1);
    }

    #[test]
    fn test_infinite_price_rejected() {
        let csv = "datetime,currency_pair,bid,ask\n2024-03-01 09:00:00,EURUSD,inf,1.1\n";
        assert!(matches!(
            TickTable::from_reader(csv.as_bytes()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_extra_columns_preserved() {
        let csv = "datetime,venue,currency_pair,bid,ask\n2024-03-01 09:00:00,LDN,EURUSD,1.1,1.2\n2024-03-01 09:00:01,,EURUSD,1.1,1.2\n";
        let table = TickTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.rows()[0].extra, vec!["LDN".to_string()]);
        assert_eq!(table.rows()[1].missing_cells(&table), 1);
    }

    #[test]
    fn test_from_path_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample_fx_data_A.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let table = TickTable::from_path(&path).unwrap();
        assert_eq!(table.len(), 4);
        assert!(table.has_column(VOLUME));
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv.gz");
        assert!(matches!(
            TickTable::from_path(&path),
            Err(Error::MissingInput(p)) if p == path
        ));
    }
}
