//! Data access port trait.

use crate::domain::error::AllocError;
use crate::domain::ohlcv::{OhlcvBar, PriceField};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};

/// Field -> symbol -> values aligned to the requested sessions.
pub type PriceFrame = BTreeMap<PriceField, HashMap<String, Vec<f64>>>;

pub trait DataPort {
    /// Bars for `symbol` with `start_date <= date <= end_date`, ascending.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AllocError>;

    fn list_symbols(&self) -> Result<Vec<String>, AllocError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AllocError>;

    /// Values of `fields` for every symbol at every session. A session with no
    /// bar for a symbol yields NaN.
    fn fetch(
        &self,
        sessions: &[NaiveDateTime],
        symbols: &[String],
        fields: &[PriceField],
    ) -> Result<PriceFrame, AllocError> {
        let mut frame: PriceFrame = fields.iter().map(|f| (*f, HashMap::new())).collect();

        let (Some(first), Some(last)) = (sessions.first(), sessions.last()) else {
            return Ok(frame);
        };

        for symbol in symbols {
            let bars = self.fetch_ohlcv(symbol, first.date(), last.date())?;
            let by_date: HashMap<NaiveDate, &OhlcvBar> =
                bars.iter().map(|bar| (bar.date, bar)).collect();

            for field in fields {
                let series = sessions
                    .iter()
                    .map(|s| {
                        by_date
                            .get(&s.date())
                            .map_or(f64::NAN, |bar| bar.field(*field))
                    })
                    .collect();
                frame
                    .entry(*field)
                    .or_default()
                    .insert(symbol.clone(), series);
            }
        }

        Ok(frame)
    }
}
