//! Configuration validation.
//!
//! Checks the INI sections before any data is touched. The `read_*` helpers
//! are shared with the CLI so a value is parsed the same way wherever it is
//! consumed.

use crate::domain::allocation::DEFAULT_GRANULARITY_STEPS;
use crate::domain::error::AllocError;
use crate::domain::portfolio::end_of_day;
use crate::domain::symbols::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::{NaiveDate, NaiveTime};

pub const DATA_SOURCES: [&str; 2] = ["csv", "sqlite"];

fn missing(section: &str, key: &str) -> AllocError {
    AllocError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> AllocError {
    AllocError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), AllocError> {
    validate_portfolio_config(config)?;
    validate_optimizer_config(config)?;
    validate_data_config(config)?;
    Ok(())
}

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), AllocError> {
    let start = read_date(config, "portfolio", "start_date")?;
    let end = read_date(config, "portfolio", "end_date")?;
    if start > end {
        return Err(invalid(
            "portfolio",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    read_symbols(config)?;
    read_granularity_steps(config)?;
    read_session_time(config)?;
    Ok(())
}

pub fn validate_optimizer_config(config: &dyn ConfigPort) -> Result<(), AllocError> {
    read_non_negative(config, "optimizer", "threads")?;
    read_non_negative(config, "optimizer", "timeout_secs")?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), AllocError> {
    match read_data_source(config)?.as_str() {
        "sqlite" => {
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| missing("sqlite", "path"))?;
            read_pool_size(config)?;
        }
        _ => {
            config
                .get_string("data", "path")
                .ok_or_else(|| missing("data", "path"))?;
        }
    }
    Ok(())
}

pub fn read_date(config: &dyn ConfigPort, section: &str, key: &str) -> Result<NaiveDate, AllocError> {
    let raw = config
        .get_string(section, key)
        .ok_or_else(|| missing(section, key))?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| invalid(section, key, format!("invalid {key} format, expected YYYY-MM-DD")))
}

pub fn read_symbols(config: &dyn ConfigPort) -> Result<Vec<String>, AllocError> {
    let raw = config
        .get_string("portfolio", "symbols")
        .ok_or_else(|| missing("portfolio", "symbols"))?;
    parse_symbols(&raw).map_err(|e| invalid("portfolio", "symbols", e.to_string()))
}

pub fn read_granularity_steps(config: &dyn ConfigPort) -> Result<u32, AllocError> {
    match config.get_string("portfolio", "granularity_steps") {
        None => Ok(DEFAULT_GRANULARITY_STEPS),
        Some(raw) => match raw.parse::<u32>() {
            Ok(steps) if steps >= 1 => Ok(steps),
            _ => Err(invalid(
                "portfolio",
                "granularity_steps",
                "granularity_steps must be a positive integer",
            )),
        },
    }
}

pub fn read_session_time(config: &dyn ConfigPort) -> Result<NaiveTime, AllocError> {
    match config.get_string("portfolio", "session_time") {
        None => Ok(end_of_day()),
        Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|_| {
            invalid("portfolio", "session_time", "session_time must be HH:MM")
        }),
    }
}

/// Lowercased `[data] source`, defaulting to `csv`.
pub fn read_data_source(config: &dyn ConfigPort) -> Result<String, AllocError> {
    let source = config
        .get_string("data", "source")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown source {source:?}, expected one of {DATA_SOURCES:?}"),
        ));
    }
    Ok(source)
}

/// `[sqlite] pool_size`, default 4, between 1 and `u32::MAX`.
pub fn read_pool_size(config: &dyn ConfigPort) -> Result<u32, AllocError> {
    u32::try_from(config.get_int("sqlite", "pool_size", 4))
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| {
            invalid(
                "sqlite",
                "pool_size",
                format!("pool_size must be between 1 and {}", u32::MAX),
            )
        })
}

/// Missing keys read as 0.
pub fn read_non_negative(config: &dyn ConfigPort, section: &str, key: &str) -> Result<u64, AllocError> {
    match config.get_string(section, key) {
        None => Ok(0),
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| invalid(section, key, format!("{key} must be a non-negative integer"))),
    }
}
