//! CSV file data adapter: one `<SYMBOL>.csv` per symbol in a directory.
//!
//! Columns: `date,open,high,low,close,volume[,actual_close]`. When
//! `actual_close` is absent it equals `close`.

use crate::domain::error::AllocError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AllocError> {
        let path = config
            .get_string("data", "path")
            .ok_or_else(|| AllocError::ConfigMissing {
                section: "data".into(),
                key: "path".into(),
            })?;
        Ok(Self::new(PathBuf::from(path)))
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<OhlcvBar>, AllocError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| AllocError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| AllocError::provider(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| AllocError::provider("missing date column"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| AllocError::provider(format!("invalid date format: {}", e)))?;

            let close: f64 = parse_column(&record, 4, "close")?;
            let actual_close = match record.get(6).map(str::trim) {
                Some(raw) if !raw.is_empty() => parse_column(&record, 6, "actual_close")?,
                _ => close,
            };

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: parse_column(&record, 1, "open")?,
                high: parse_column(&record, 2, "high")?,
                low: parse_column(&record, 3, "low")?,
                close,
                volume: parse_column(&record, 5, "volume")?,
                actual_close,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn parse_column<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, AllocError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| AllocError::provider(format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| AllocError::provider(format!("invalid {} value: {}", name, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AllocError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, AllocError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            AllocError::provider(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| AllocError::provider(format!("directory entry error: {}", e)))?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AllocError> {
        let bars = match self.read_all(symbol) {
            Ok(bars) => bars,
            Err(AllocError::DataUnavailable { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
