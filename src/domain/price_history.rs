//! Close-price arena for one optimization run.
//!
//! Prices are fetched once per run and shared read-only by every candidate
//! evaluation. Series are aligned to the trading sessions of the window.

use crate::domain::cancel::CancelToken;
use crate::domain::error::AllocError;
use crate::domain::ohlcv::PriceField;
use crate::domain::portfolio::PortfolioSpec;
use crate::ports::calendar_port::CalendarPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PriceHistory {
    sessions: Vec<NaiveDateTime>,
    symbols: Vec<String>,
    closes: Vec<Vec<f64>>,
}

impl PriceHistory {
    /// Resolve the sessions of the window and fetch close prices for the
    /// portfolio's symbols.
    pub fn load(
        data_port: &dyn DataPort,
        calendar: &dyn CalendarPort,
        spec: &PortfolioSpec,
    ) -> Result<Self, AllocError> {
        Self::load_cancellable(data_port, calendar, spec, &CancelToken::new())
    }

    /// Like [`PriceHistory::load`], checking `cancel` before each symbol is
    /// fetched.
    pub fn load_cancellable(
        data_port: &dyn DataPort,
        calendar: &dyn CalendarPort,
        spec: &PortfolioSpec,
        cancel: &CancelToken,
    ) -> Result<Self, AllocError> {
        cancel.check()?;
        let PortfolioSpec {
            range,
            symbols,
            session_time,
        } = spec;
        if symbols.is_empty() {
            return Err(AllocError::invalid("at least one symbol is required"));
        }

        let sessions = calendar.trading_sessions(range, *session_time)?;
        if sessions.is_empty() {
            return Err(AllocError::EmptyRange {
                start: range.start(),
                end: range.end(),
            });
        }

        info!(
            symbols = symbols.len(),
            sessions = sessions.len(),
            "loading close prices for {range}"
        );

        let mut closes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            cancel.check()?;
            let mut frame =
                data_port.fetch(&sessions, std::slice::from_ref(symbol), &[PriceField::Close])?;
            let raw = frame
                .remove(&PriceField::Close)
                .and_then(|mut m| m.remove(symbol))
                .unwrap_or_else(|| vec![f64::NAN; sessions.len()]);
            closes.push(fill_gaps(symbol, raw)?);
        }

        Self::from_closes(sessions, symbols.clone(), closes)
    }

    /// Build from already-aligned close series, one per symbol.
    pub fn from_closes(
        sessions: Vec<NaiveDateTime>,
        symbols: Vec<String>,
        closes: Vec<Vec<f64>>,
    ) -> Result<Self, AllocError> {
        if sessions.is_empty() {
            return Err(AllocError::invalid("price history needs at least one session"));
        }
        if symbols.len() != closes.len() {
            return Err(AllocError::invalid(format!(
                "{} symbols but {} close series",
                symbols.len(),
                closes.len()
            )));
        }
        for (symbol, series) in symbols.iter().zip(&closes) {
            if series.len() != sessions.len() {
                return Err(AllocError::DataUnavailable {
                    symbol: symbol.clone(),
                    reason: format!(
                        "{} closes for {} sessions",
                        series.len(),
                        sessions.len()
                    ),
                });
            }
            if series.iter().any(|v| !v.is_finite()) {
                return Err(AllocError::DataUnavailable {
                    symbol: symbol.clone(),
                    reason: "non-finite close price".into(),
                });
            }
            if let Some((i, close)) = series.iter().enumerate().find(|(_, c)| **c <= 0.0) {
                return Err(AllocError::DataUnavailable {
                    symbol: symbol.clone(),
                    reason: format!("close {close} at session {} is not positive", sessions[i]),
                });
            }
        }

        Ok(Self {
            sessions,
            symbols,
            closes,
        })
    }

    pub fn sessions(&self) -> &[NaiveDateTime] {
        &self.sessions
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn closes(&self, index: usize) -> &[f64] {
        &self.closes[index]
    }

    pub fn closes_for(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.closes[i].as_slice())
    }

    pub fn all_closes(&self) -> &[Vec<f64>] {
        &self.closes
    }
}

/// Forward-fill then back-fill missing closes.
fn fill_gaps(symbol: &str, mut series: Vec<f64>) -> Result<Vec<f64>, AllocError> {
    let missing = series.iter().filter(|v| !v.is_finite()).count();
    if missing == 0 {
        return Ok(series);
    }
    if missing == series.len() {
        return Err(AllocError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "no close prices in range".into(),
        });
    }

    let mut last = f64::NAN;
    for v in series.iter_mut() {
        if v.is_finite() {
            last = *v;
        } else {
            *v = last;
        }
    }
    let mut next = f64::NAN;
    for v in series.iter_mut().rev() {
        if v.is_finite() {
            next = *v;
        } else {
            *v = next;
        }
    }

    warn!(symbol, missing, "filled sessions without a close price");
    Ok(series)
}
