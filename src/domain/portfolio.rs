//! Portfolio definition: which symbols, over which window, sampled when.

use crate::domain::date_range::DateRange;
use crate::domain::error::AllocError;
use chrono::NaiveTime;

/// Intraday marker for end-of-day closes.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default()
}

/// Ordered symbols over a simulation window. Weight vectors pair with
/// `symbols` positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSpec {
    pub range: DateRange,
    pub symbols: Vec<String>,
    pub session_time: NaiveTime,
}

impl PortfolioSpec {
    pub fn new(range: DateRange, symbols: Vec<String>) -> Result<Self, AllocError> {
        if symbols.is_empty() {
            return Err(AllocError::invalid("at least one symbol is required"));
        }
        Ok(Self {
            range,
            symbols,
            session_time: end_of_day(),
        })
    }

    pub fn with_session_time(mut self, session_time: NaiveTime) -> Self {
        self.session_time = session_time;
        self
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2011, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2011, 12, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn defaults_to_end_of_day() {
        let spec = PortfolioSpec::new(range(), vec!["GOOG".into(), "XOM".into()]).unwrap();
        assert_eq!(spec.session_time, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(spec.symbol_count(), 2);
    }

    #[test]
    fn rejects_empty_symbol_list() {
        let err = PortfolioSpec::new(range(), vec![]).unwrap_err();
        assert!(matches!(err, AllocError::InvalidArgument { .. }));
    }

    #[test]
    fn session_time_override() {
        let t = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let spec = PortfolioSpec::new(range(), vec!["GLD".into()])
            .unwrap()
            .with_session_time(t);
        assert_eq!(spec.session_time, t);
    }
}
