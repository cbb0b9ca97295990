//! Temporal signal extraction from free text.
//!
//! Rules, from highest to lowest precedence:
//! 1. A context item's structured `occurred_at` field, trusted as-is.
//! 2. Calendar dates: ISO `YYYY-MM-DD`, `Month D, YYYY`, `D Month YYYY`, and
//!    `Month D` (assumes the year of `now`).
//! 3. `tomorrow at H[:MM][am|pm]`.
//! 4. Relative keywords: `tomorrow`, `today`, `next week`, `this weekend`,
//!    and bare weekday names.
//!
//! A match claims its span of text; lower-precedence rules cannot match
//! inside a claimed span, so "tomorrow at 3pm" yields one date rather than
//! also yielding midnight tomorrow. Day-granular rules resolve to local
//! midnight on `now`'s clock.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use regex::Regex;

use crate::calendar::{at_local, midnight};
use crate::lexicon::Lexicon;
use crate::types::{ContextItem, DateKind, ExtractedDate, Timestamp};
use crate::urgency::has_urgent_keyword;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Days in "next week" and in the no-date fallback.
const WEEK_DAYS: i64 = 7;

fn month_alternation() -> String {
    MONTHS.join("|")
}

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static MONTH_DAY_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({})\s+(\d{{1,2}}),\s+(\d{{4}})\b",
        month_alternation()
    ))
    .unwrap()
});

static DAY_MONTH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})\s+({})\s+(\d{{4}})\b",
        month_alternation()
    ))
    .unwrap()
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\s+(\d{{1,2}})\b", month_alternation())).unwrap()
});

static TOMORROW_AT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btomorrow\s+at\s+(\d{1,2})(?:\s*:\s*(\d{1,2}))?(?:\s*(am|pm)\b)?").unwrap()
});

static RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(tomorrow|today|next\s+week|this\s+weekend|{})\b",
        WEEKDAYS.join("|")
    ))
    .unwrap()
});

/// A rule match before span arbitration.
struct Candidate {
    start: usize,
    end: usize,
    /// Acceptance order: lower wins when spans overlap.
    precedence: u8,
    kind: DateKind,
    timestamp: Timestamp,
    text: String,
}

/// Extract dates from every context item, applying the fallback policy.
///
/// If nothing is found anywhere, one date is synthesized: tomorrow when any
/// text carries an urgency keyword, otherwise exactly a week after `now`.
/// The result is therefore never empty.
pub fn extract_dates(
    items: &[ContextItem],
    now: Timestamp,
    lexicon: &Lexicon,
) -> Vec<ExtractedDate> {
    let mut found = extract_explicit(items, now);
    if !found.is_empty() {
        return found;
    }

    if items.iter().any(|item| has_urgent_keyword(&item.text, lexicon)) {
        tracing::debug!("no explicit date in context; urgent wording implies tomorrow");
        found.push(ExtractedDate {
            timestamp: midnight(now) + Duration::days(1),
            source_text: "urgent context without an explicit date".to_string(),
            kind: DateKind::Fallback,
        });
    } else {
        found.push(ExtractedDate {
            timestamp: now + Duration::days(WEEK_DAYS),
            source_text: "no date found in context".to_string(),
            kind: DateKind::Fallback,
        });
    }
    found
}

/// Extract dates from every context item without any fallback.
///
/// Output is grouped by item in input order; within an item the structured
/// field comes first, then text matches ordered by rule precedence and
/// position.
pub fn extract_explicit(items: &[ContextItem], now: Timestamp) -> Vec<ExtractedDate> {
    let mut found = Vec::new();
    for item in items {
        if let Some(occurred_at) = item.occurred_at {
            found.push(ExtractedDate {
                timestamp: occurred_at,
                source_text: item.text.clone(),
                kind: DateKind::Structured,
            });
        }
        found.extend(extract_from_text(&item.text, now));
    }
    found
}

/// Extract dates from a single piece of text.
pub fn extract_from_text(text: &str, now: Timestamp) -> Vec<ExtractedDate> {
    let mut candidates = Vec::new();
    collect_absolute(text, now, &mut candidates);
    collect_tomorrow_at(text, now, &mut candidates);
    collect_relative(text, now, &mut candidates);

    candidates.sort_by_key(|c| (c.precedence, c.start));

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut accepted: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let overlaps = claimed
            .iter()
            .any(|&(start, end)| candidate.start < end && candidate.end > start);
        if overlaps {
            continue;
        }
        claimed.push((candidate.start, candidate.end));
        accepted.push(candidate);
    }

    // Precedence groups: absolute dates, then "tomorrow at", then relative.
    accepted.sort_by_key(|c| (group_of(c.kind), c.start));
    accepted
        .into_iter()
        .map(|c| ExtractedDate {
            timestamp: c.timestamp,
            source_text: c.text,
            kind: c.kind,
        })
        .collect()
}

/// The earliest date in `dates`.
pub fn earliest(dates: &[ExtractedDate]) -> Option<&ExtractedDate> {
    dates.iter().min_by_key(|d| d.timestamp)
}

const fn group_of(kind: DateKind) -> u8 {
    match kind {
        DateKind::Structured => 0,
        DateKind::Absolute => 1,
        DateKind::TomorrowAt => 2,
        DateKind::Relative => 3,
        DateKind::Fallback => 4,
    }
}

fn month_index(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .and_then(|i| u32::try_from(i + 1).ok())
}

fn calendar_date(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year?, month?, day?)
}

fn collect_absolute(text: &str, now: Timestamp, out: &mut Vec<Candidate>) {
    let offset = *now.offset();
    let mut push = |m: Option<regex::Match<'_>>, precedence: u8, date: Option<NaiveDate>| {
        let Some(m) = m else {
            return;
        };
        let Some(date) = date else {
            tracing::trace!(matched = m.as_str(), "skipping unparseable calendar date");
            return;
        };
        out.push(Candidate {
            start: m.start(),
            end: m.end(),
            precedence,
            kind: DateKind::Absolute,
            timestamp: at_local(offset, date, NaiveTime::MIN),
            text: m.as_str().to_string(),
        });
    };

    for caps in ISO_DATE_RE.captures_iter(text) {
        let date = calendar_date(
            caps[1].parse().ok(),
            caps[2].parse().ok(),
            caps[3].parse().ok(),
        );
        push(caps.get(0), 10, date);
    }

    for caps in MONTH_DAY_YEAR_RE.captures_iter(text) {
        let date = calendar_date(
            caps[3].parse().ok(),
            month_index(&caps[1]),
            caps[2].parse().ok(),
        );
        push(caps.get(0), 11, date);
    }

    for caps in DAY_MONTH_YEAR_RE.captures_iter(text) {
        let date = calendar_date(
            caps[3].parse().ok(),
            month_index(&caps[2]),
            caps[1].parse().ok(),
        );
        push(caps.get(0), 12, date);
    }

    for caps in MONTH_DAY_RE.captures_iter(text) {
        let date = calendar_date(Some(now.year()), month_index(&caps[1]), caps[2].parse().ok());
        push(caps.get(0), 13, date);
    }
}

fn collect_tomorrow_at(text: &str, now: Timestamp, out: &mut Vec<Candidate>) {
    let tomorrow = now.date_naive() + Duration::days(1);
    for caps in TOMORROW_AT_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Ok(mut hour) = caps[1].parse::<u32>() else {
            continue;
        };
        let minute = caps
            .get(2)
            .map_or(Some(0), |m| m.as_str().parse::<u32>().ok());
        let meridiem = caps.get(3).map(|m| m.as_str().to_ascii_lowercase());
        match meridiem.as_deref() {
            Some("pm") if hour < 12 => hour += 12,
            Some("am") if hour == 12 => hour = 0,
            _ => {}
        }
        let Some(time) = minute.and_then(|minute| NaiveTime::from_hms_opt(hour, minute, 0)) else {
            tracing::trace!(matched = whole.as_str(), "skipping unparseable clock time");
            continue;
        };
        out.push(Candidate {
            start: whole.start(),
            end: whole.end(),
            precedence: 20,
            kind: DateKind::TomorrowAt,
            timestamp: at_local(*now.offset(), tomorrow, time),
            text: whole.as_str().to_string(),
        });
    }
}

fn collect_relative(text: &str, now: Timestamp, out: &mut Vec<Candidate>) {
    let today = midnight(now);
    let weekday_today = i64::from(now.weekday().num_days_from_monday());

    for m in RELATIVE_RE.find_iter(text) {
        let word = m
            .as_str()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        let days_ahead = match word.as_str() {
            "today" => 0,
            "tomorrow" => 1,
            "next week" => WEEK_DAYS,
            // Saturday of the current week, or today if it is Saturday.
            "this weekend" => (5 - weekday_today).rem_euclid(7),
            name => {
                let Some(target) = WEEKDAYS.iter().position(|d| *d == name) else {
                    continue;
                };
                // Next occurrence on or after today; today counts.
                let target = i64::try_from(target).unwrap_or_default();
                (target - weekday_today).rem_euclid(7)
            }
        };
        out.push(Candidate {
            start: m.start(),
            end: m.end(),
            precedence: 30,
            kind: DateKind::Relative,
            timestamp: today + Duration::days(days_ahead),
            text: m.as_str().to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Weekday};

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    /// 2025-01-13 is a Monday.
    fn monday(hour: u32) -> Timestamp {
        offset().with_ymd_and_hms(2025, 1, 13, hour, 0, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        offset().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn only(text: &str, now: Timestamp) -> ExtractedDate {
        let found = extract_from_text(text, now);
        assert_eq!(found.len(), 1, "expected one date in {text:?}, got {found:?}");
        found.into_iter().next().unwrap()
    }

    #[test]
    fn tomorrow_at_pm_resolves_to_clock_time() {
        let date = only("Submit report tomorrow at 3pm", monday(10));
        assert_eq!(date.timestamp, at(2025, 1, 14, 15, 0));
        assert_eq!(date.kind, DateKind::TomorrowAt);
    }

    #[test]
    fn tomorrow_at_handles_minutes_and_midnight() {
        assert_eq!(
            only("call tomorrow at 10:30", monday(10)).timestamp,
            at(2025, 1, 14, 10, 30)
        );
        assert_eq!(
            only("ship tomorrow at 12am", monday(10)).timestamp,
            at(2025, 1, 14, 0, 0)
        );
        assert_eq!(
            only("lunch tomorrow at 12pm", monday(10)).timestamp,
            at(2025, 1, 14, 12, 0)
        );
    }

    #[test]
    fn invalid_clock_time_falls_back_to_plain_tomorrow() {
        let date = only("tomorrow at 27pm", monday(10));
        assert_eq!(date.timestamp, at(2025, 1, 14, 0, 0));
        assert_eq!(date.kind, DateKind::Relative);
    }

    #[test]
    fn iso_and_month_name_dates() {
        let now = monday(10);
        assert_eq!(only("due 2025-02-03", now).timestamp, at(2025, 2, 3, 0, 0));
        assert_eq!(
            only("launch on July 8, 2025", now).timestamp,
            at(2025, 7, 8, 0, 0)
        );
        assert_eq!(
            only("launch on 8 July 2025", now).timestamp,
            at(2025, 7, 8, 0, 0)
        );
        assert_eq!(only("review March 3", now).timestamp, at(2025, 3, 3, 0, 0));
    }

    #[test]
    fn month_day_without_year_uses_current_year_even_if_past() {
        let date = only("kickoff was January 2", monday(10));
        assert_eq!(date.timestamp, at(2025, 1, 2, 0, 0));
    }

    #[test]
    fn impossible_calendar_dates_are_skipped() {
        assert!(extract_from_text("on 2025-02-30 we ship", monday(10)).is_empty());
        assert!(extract_from_text("February 31, 2025", monday(10)).is_empty());
    }

    #[test]
    fn relative_keywords() {
        let now = monday(10);
        assert_eq!(only("do it today", now).timestamp, at(2025, 1, 13, 0, 0));
        assert_eq!(only("Tomorrow works", now).timestamp, at(2025, 1, 14, 0, 0));
        assert_eq!(only("sometime next week", now).timestamp, at(2025, 1, 20, 0, 0));
        assert_eq!(only("this weekend", now).timestamp, at(2025, 1, 18, 0, 0));
    }

    #[test]
    fn weekday_names_resolve_forward_and_today_counts() {
        let now = monday(10);
        assert_eq!(only("on Friday", now).timestamp, at(2025, 1, 17, 0, 0));
        assert_eq!(only("by Sunday", now).timestamp, at(2025, 1, 19, 0, 0));
        // Same weekday as now: zero days ahead.
        let same_day = only("Monday sync", now);
        assert_eq!(same_day.timestamp, at(2025, 1, 13, 0, 0));
        assert_eq!(same_day.timestamp.weekday(), Weekday::Mon);
    }

    #[test]
    fn this_weekend_on_saturday_is_today_and_on_sunday_is_next_saturday() {
        let saturday = at(2025, 1, 18, 9, 0);
        assert_eq!(only("this weekend", saturday).timestamp, at(2025, 1, 18, 0, 0));
        let sunday = at(2025, 1, 19, 9, 0);
        assert_eq!(only("this weekend", sunday).timestamp, at(2025, 1, 25, 0, 0));
    }

    #[test]
    fn multiple_matches_are_ordered_by_precedence_then_position() {
        let found = extract_from_text("Friday standup, then 2025-03-01 and tomorrow", monday(10));
        let sources: Vec<_> = found.iter().map(|d| d.source_text.as_str()).collect();
        assert_eq!(sources, vec!["2025-03-01", "Friday", "tomorrow"]);
    }

    #[test]
    fn structured_field_is_trusted_first() {
        let occurred = at(2025, 1, 10, 8, 0);
        let items = vec![ContextItem {
            text: "see you Friday".to_string(),
            occurred_at: Some(occurred),
        }];
        let found = extract_explicit(&items, monday(10));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, DateKind::Structured);
        assert_eq!(found[0].timestamp, occurred);
        assert_eq!(found[1].timestamp, at(2025, 1, 17, 0, 0));
    }

    #[test]
    fn fallback_is_tomorrow_for_urgent_text() {
        let items = vec![ContextItem::new("This is URGENT, please handle")];
        let found = extract_dates(&items, monday(10), &Lexicon::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DateKind::Fallback);
        assert_eq!(found[0].timestamp, at(2025, 1, 14, 0, 0));
    }

    #[test]
    fn fallback_is_next_week_otherwise() {
        let items = vec![ContextItem::new("lovely weather")];
        let found = extract_dates(&items, monday(10), &Lexicon::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].timestamp, at(2025, 1, 20, 10, 0));

        let empty = extract_dates(&[], monday(10), &Lexicon::default());
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].kind, DateKind::Fallback);
    }

    #[test]
    fn earliest_picks_minimum() {
        let found = extract_from_text("next week or maybe tomorrow", monday(10));
        assert_eq!(earliest(&found).unwrap().timestamp, at(2025, 1, 14, 0, 0));
        assert!(earliest(&[]).is_none());
    }

    #[test]
    fn dates_follow_the_offset_of_now() {
        let plus_five = FixedOffset::east_opt(5 * 3600).unwrap();
        let now = plus_five.with_ymd_and_hms(2025, 1, 13, 10, 0, 0).unwrap();
        let date = only("tomorrow at 9am", now);
        assert_eq!(date.timestamp.to_rfc3339(), "2025-01-14T09:00:00+05:00");
    }

    fn render(dates: &[ExtractedDate]) -> String {
        dates
            .iter()
            .map(|d| format!("{:?} {} {:?}", d.kind, d.timestamp.to_rfc3339(), d.source_text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn extraction_keeps_item_order() {
        let items = [
            ContextItem {
                text: "sync".to_string(),
                occurred_at: Some(at(2025, 1, 10, 8, 0)),
            },
            ContextItem::new("ship 2025-01-20, review tomorrow at 9am"),
        ];
        let dates = extract_dates(&items, monday(10), &Lexicon::default());
        insta::assert_snapshot!(render(&dates), @r#"
        Structured 2025-01-10T08:00:00+00:00 "sync"
        Absolute 2025-01-20T00:00:00+00:00 "2025-01-20"
        TomorrowAt 2025-01-14T09:00:00+00:00 "tomorrow at 9am"
        "#);
    }
}
