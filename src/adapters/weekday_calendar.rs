//! Weekday trading calendar with an explicit holiday list.

use crate::domain::date_range::DateRange;
use crate::domain::error::AllocError;
use crate::ports::calendar_port::CalendarPort;
use crate::ports::config_port::ConfigPort;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::collections::BTreeSet;

/// Monday to Friday, minus configured holidays.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(holidays: I) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Reads `[calendar] holidays` as a comma-separated list of dates.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AllocError> {
        let mut holidays = BTreeSet::new();
        for raw in config.get_list("calendar", "holidays") {
            let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                AllocError::ConfigInvalid {
                    section: "calendar".into(),
                    key: "holidays".into(),
                    reason: format!("invalid date {raw:?} (expected YYYY-MM-DD)"),
                }
            })?;
            holidays.insert(date);
        }
        Ok(Self { holidays })
    }

    pub fn is_session(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

impl CalendarPort for WeekdayCalendar {
    fn trading_sessions(
        &self,
        range: &DateRange,
        session_time: NaiveTime,
    ) -> Result<Vec<NaiveDateTime>, AllocError> {
        Ok(range
            .days()
            .filter(|d| self.is_session(*d))
            .map(|d| d.and_time(session_time))
            .collect())
    }
}
