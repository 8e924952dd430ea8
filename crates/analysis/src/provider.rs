//! Provider tick file discovery and loading.

use fx_core::{Error, Result};
use fx_ingestion::reader::{ASK, BID, CURRENCY_PAIR, DATETIME, VOLUME};
use fx_ingestion::TickTable;
use std::fs;
use std::path::{Path, PathBuf};

/// Columns every provider file must carry.
pub const PROVIDER_COLUMNS: [&str; 5] = [DATETIME, CURRENCY_PAIR, BID, ASK, VOLUME];

/// One provider's tick table.
#[derive(Debug, Clone)]
pub struct ProviderData {
    pub name: String,
    pub path: PathBuf,
    pub table: TickTable,
}

/// Provider name from a tick file name.
///
/// The name is whatever follows the last underscore once the suffix is
/// removed: `sample_fx_data_A.csv.gz` -> `A`.
pub fn provider_name(file_name: &str, suffix: &str) -> Option<String> {
    let stem = file_name.strip_suffix(suffix)?;
    let name = stem.rsplit('_').next().unwrap_or(stem);
    (!name.is_empty()).then(|| name.to_string())
}

/// Load every provider file in `dir` whose name ends with `suffix`.
///
/// Files are read in sorted path order.
pub fn load_providers(dir: &Path, suffix: &str) -> Result<Vec<ProviderData>> {
    if !dir.is_dir() {
        return Err(Error::missing_input(dir));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(Error::data_availability(format!(
            "no '*{suffix}' tick files found in {}",
            dir.display()
        )));
    }

    let mut providers: Vec<ProviderData> = Vec::with_capacity(paths.len());
    for path in paths {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let name = provider_name(file_name, suffix).ok_or_else(|| {
            Error::validation(format!("cannot derive a provider name from '{file_name}'"))
        })?;

        if let Some(existing) = providers.iter().find(|p| p.name == name) {
            return Err(Error::validation(format!(
                "provider '{name}' appears in both {} and {}",
                existing.path.display(),
                path.display()
            )));
        }

        let table = TickTable::from_path(&path)?;
        table.require_columns(&PROVIDER_COLUMNS)?;
        tracing::info!(provider = %name, rows = table.len(), "loaded provider ticks");

        providers.push(ProviderData { name, path, table });
    }

    Ok(providers)
}
