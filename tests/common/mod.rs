#![allow(dead_code)]

use allocopt::domain::date_range::DateRange;
use allocopt::domain::error::AllocError;
pub use allocopt::domain::ohlcv::OhlcvBar;
use allocopt::domain::portfolio::PortfolioSpec;
use allocopt::ports::calendar_port::CalendarPort;
use allocopt::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    /// Consecutive daily closes starting at `start`.
    pub fn with_closes(self, symbol: &str, start: &str, closes: &[f64]) -> Self {
        let bars = bars_from_closes(symbol, start, closes);
        self.with_bars(symbol, bars)
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    /// Number of `fetch_ohlcv` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AllocError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(symbol) {
            return Err(AllocError::provider(reason.clone()));
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, AllocError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AllocError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

/// Every calendar day is a session.
pub struct DailyCalendar;

impl CalendarPort for DailyCalendar {
    fn trading_sessions(
        &self,
        range: &DateRange,
        session_time: NaiveTime,
    ) -> Result<Vec<NaiveDateTime>, AllocError> {
        Ok(range.days().map(|d| d.and_time(session_time)).collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
        actual_close: close,
    }
}

pub fn bars_from_closes(symbol: &str, start: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let first = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    first
        .iter_days()
        .zip(closes)
        .map(|(d, close)| make_bar(symbol, &d.format("%Y-%m-%d").to_string(), *close))
        .collect()
}

pub fn portfolio(start: NaiveDate, end: NaiveDate, symbols: &[&str]) -> PortfolioSpec {
    PortfolioSpec::new(
        DateRange::new(start, end).unwrap(),
        symbols.iter().map(|s| s.to_string()).collect(),
    )
    .unwrap()
}
