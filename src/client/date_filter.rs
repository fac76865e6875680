//! Date-range filter builder
//!
//! Translates an optional (start, end, days) triple into a filter
//! expression the remote API understands. Timestamps are Unix epoch
//! seconds computed from UTC values; an end date sitting exactly at
//! midnight is widened to the end of that day so the bound stays
//! inclusive.

use super::params::Filter;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Timelike, Utc};

/// Build a date filter from an optional start/end/days triple
///
/// Rules, in priority order:
/// 1. A midnight end date is normalized to 23:59:59 of the same day.
/// 2. Start only: `gt start`; with days, `gt start, lte start + days`.
/// 3. End only: `lt end`; with days, `gt end − days, lte end`.
/// 4. Both: `gt start, lte end`; combining with days is an error.
/// 5. Neither: an error.
pub fn build_date_filter(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    days: Option<i64>,
) -> Result<Filter> {
    let end_date = end_date.map(normalize_end_of_day);

    match (start_date, end_date) {
        (Some(start), None) => match days {
            Some(days) => {
                let end = start + Duration::days(days);
                Ok(Filter::new().gt(start.timestamp()).lte(end.timestamp()))
            }
            None => Ok(Filter::new().gt(start.timestamp())),
        },
        (None, Some(end)) => match days {
            Some(days) => {
                let start = end - Duration::days(days);
                Ok(Filter::new().gt(start.timestamp()).lte(end.timestamp()))
            }
            None => Ok(Filter::new().lt(end.timestamp())),
        },
        (Some(start), Some(end)) => {
            if days.is_some() {
                Err(Error::DateRangeOverconstrained)
            } else {
                Ok(Filter::new().gt(start.timestamp()).lte(end.timestamp()))
            }
        }
        (None, None) => Err(Error::DateRangeMissing),
    }
}

/// Widen a bare-midnight end date to the last second of its day
fn normalize_end_of_day(end: DateTime<Utc>) -> DateTime<Utc> {
    if end.hour() + end.minute() + end.second() == 0 {
        end.date_naive()
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is a valid time")
            .and_utc()
    } else {
        end
    }
}
