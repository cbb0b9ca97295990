//! Local-clock helpers over [`Timestamp`].

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::Timestamp;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Builds the instant at `date` `time` on the clock described by `offset`.
pub fn at_local(offset: FixedOffset, date: NaiveDate, time: NaiveTime) -> Timestamp {
    let local = date.and_time(time);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

/// Start of the local day containing `t`.
pub fn midnight(t: Timestamp) -> Timestamp {
    at_local(*t.offset(), t.date_naive(), NaiveTime::MIN)
}

/// Fractional days from `now` until `target`; negative when `target` is past.
#[expect(
    clippy::cast_precision_loss,
    reason = "second counts within any realistic horizon fit an f64 exactly"
)]
pub fn days_until(target: Timestamp, now: Timestamp) -> f64 {
    (target - now).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Naive layouts accepted from external payloads, tried in order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a timestamp from loosely formatted text.
///
/// Accepts RFC 3339 (including a `Z` suffix), naive date-times in ISO or
/// `YYYY-MM-DD HH:MM` layout, and bare dates (local midnight). Naive values
/// are read on the clock described by `offset`.
pub fn parse_timestamp(text: &str, offset: FixedOffset) -> Option<Timestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(at_local(offset, naive.date(), naive.time()));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| at_local(offset, date, NaiveTime::MIN))
}
