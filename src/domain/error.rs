//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for allocopt.
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("no trading sessions between {start} and {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("no data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("data provider error: {reason}")]
    Provider { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("optimization cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AllocError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        AllocError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn provider(reason: impl Into<String>) -> Self {
        AllocError::Provider {
            reason: reason.into(),
        }
    }

    /// Errors caused by the data rather than by the allocation being tried.
    /// These recur identically for every candidate.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            AllocError::EmptyRange { .. }
                | AllocError::DataUnavailable { .. }
                | AllocError::Provider { .. }
        )
    }
}

impl From<&AllocError> for std::process::ExitCode {
    fn from(err: &AllocError) -> Self {
        let code: u8 = match err {
            AllocError::Io(_) => 1,
            AllocError::ConfigParse { .. }
            | AllocError::ConfigMissing { .. }
            | AllocError::ConfigInvalid { .. } => 2,
            AllocError::Provider { .. } => 3,
            AllocError::InvalidArgument { .. } => 4,
            AllocError::DataUnavailable { .. } | AllocError::EmptyRange { .. } => 5,
            AllocError::Cancelled => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_are_classified() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(AllocError::EmptyRange { start: d, end: d }.is_data_error());
        assert!(
            AllocError::DataUnavailable {
                symbol: "XOM".into(),
                reason: "missing".into(),
            }
            .is_data_error()
        );
        assert!(AllocError::provider("timeout").is_data_error());
        assert!(!AllocError::invalid("bad weights").is_data_error());
        assert!(!AllocError::Cancelled.is_data_error());
    }

    #[test]
    fn display_messages() {
        let err = AllocError::DataUnavailable {
            symbol: "GLD".into(),
            reason: "no bars in range".into(),
        };
        assert_eq!(err.to_string(), "no data for GLD: no bars in range");

        let err = AllocError::ConfigMissing {
            section: "portfolio".into(),
            key: "symbols".into(),
        };
        assert_eq!(err.to_string(), "missing config key [portfolio] symbols");
    }
}
