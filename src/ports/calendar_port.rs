//! Trading calendar port trait.

use crate::domain::date_range::DateRange;
use crate::domain::error::AllocError;
use chrono::{NaiveDateTime, NaiveTime};

/// Resolves which days in a range are trading sessions.
pub trait CalendarPort {
    /// One timestamp per trading day in `range`, ascending, each stamped with
    /// `session_time` (e.g. 16:00 for end of day).
    fn trading_sessions(
        &self,
        range: &DateRange,
        session_time: NaiveTime,
    ) -> Result<Vec<NaiveDateTime>, AllocError>;
}
