//! Bar table writing.
//!
//! Bars are written as a gzip-compressed CSV. The gzip header carries no
//! timestamp, so identical bars always produce identical bytes.

use chrono::{NaiveDateTime, Timelike};
use flate2::write::GzEncoder;
use flate2::Compression;
use fx_core::{Bar, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output header.
pub const BAR_COLUMNS: [&str; 6] = ["currency_pair", "timestamp", "open", "high", "low", "close"];

fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

/// Write bars as uncompressed CSV to any writer.
pub fn write_bars_to<W: Write>(writer: W, bars: &[Bar]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(BAR_COLUMNS)?;

    for bar in bars {
        writer.write_record([
            bar.currency_pair.to_string(),
            format_timestamp(&bar.timestamp),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write bars to `path` as gzip-compressed CSV.
///
/// Parent directories are created. Bytes go to a sibling temp file that is
/// renamed over `path` only once fully written.
pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let written = write_gzip(&tmp, bars).and_then(|()| fs::rename(&tmp, path).map_err(Into::into));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written?;

    tracing::debug!(path = %path.display(), bars = bars.len(), "wrote bars");
    Ok(())
}

fn write_gzip(path: &Path, bars: &[Bar]) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    write_bars_to(&mut encoder, bars)?;
    let mut inner = encoder.finish()?;
    inner.flush()?;
    Ok(())
}
