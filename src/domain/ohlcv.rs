//! Daily OHLCV bar and the price fields a data source can serve.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Adjusted close. This is the series the evaluator consumes.
    pub close: f64,
    pub volume: i64,
    /// Unadjusted close as printed on the day.
    pub actual_close: f64,
}

impl OhlcvBar {
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume as f64,
            PriceField::ActualClose => self.actual_close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
    ActualClose,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
            PriceField::ActualClose => "actual_close",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            symbol: "XOM".into(),
            date: NaiveDate::from_ymd_opt(2011, 1, 3).unwrap(),
            open: 74.5,
            high: 75.9,
            low: 74.2,
            close: 73.1,
            volume: 53_000,
            actual_close: 75.6,
        }
    }

    #[test]
    fn field_lookup() {
        let bar = sample_bar();
        assert_eq!(bar.field(PriceField::Open), 74.5);
        assert_eq!(bar.field(PriceField::Close), 73.1);
        assert_eq!(bar.field(PriceField::ActualClose), 75.6);
        assert_eq!(bar.field(PriceField::Volume), 53_000.0);
    }

    #[test]
    fn field_names() {
        assert_eq!(PriceField::Close.to_string(), "close");
        assert_eq!(PriceField::ActualClose.to_string(), "actual_close");
    }
}
