//! Urgency classification for context text.

use crate::calendar::days_until;
use crate::lexicon::Lexicon;
use crate::temporal::{earliest, extract_explicit};
use crate::types::{ContextItem, ExtractedDate, Timestamp};

/// Dates closer than this many days make a text urgent.
pub const URGENT_WITHIN_DAYS: f64 = 7.0;

/// True if `text` contains any urgency keyword (case-insensitive substring).
pub fn has_urgent_keyword(text: &str, lexicon: &Lexicon) -> bool {
    let lowered = text.to_lowercase();
    Lexicon::first_hit(&lexicon.urgency_keywords, &lowered).is_some()
}

/// True if `text` carries an urgency keyword or the earliest of `extracted`
/// is less than a week after `now`.
pub fn is_urgent(
    text: &str,
    extracted: &[ExtractedDate],
    now: Timestamp,
    lexicon: &Lexicon,
) -> bool {
    if has_urgent_keyword(text, lexicon) {
        return true;
    }
    earliest(extracted).is_some_and(|date| days_until(date.timestamp, now) < URGENT_WITHIN_DAYS)
}

/// Classifies one context item against its own explicit dates.
///
/// Fallback dates are not considered: a synthesized "a week from today"
/// would otherwise make every item urgent.
pub fn is_item_urgent(item: &ContextItem, now: Timestamp, lexicon: &Lexicon) -> bool {
    let dates = extract_explicit(std::slice::from_ref(item), now);
    is_urgent(&item.text, &dates, now, lexicon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    use crate::types::DateKind;

    fn now() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 13, 10, 0, 0)
            .unwrap()
    }

    fn date_in(days: i64) -> ExtractedDate {
        ExtractedDate {
            timestamp: now() + Duration::days(days),
            source_text: String::new(),
            kind: DateKind::Absolute,
        }
    }

    #[test]
    fn keywords_are_case_insensitive_substrings() {
        let lexicon = Lexicon::default();
        assert!(has_urgent_keyword("Please reply ASAP", &lexicon));
        // "due" matches inside "overdue".
        assert!(has_urgent_keyword("invoice overdue", &lexicon));
        assert!(!has_urgent_keyword("a relaxed afternoon", &lexicon));
    }

    #[test]
    fn near_dates_are_urgent_without_keywords() {
        let lexicon = Lexicon::default();
        assert!(is_urgent("plain text", &[date_in(3)], now(), &lexicon));
        assert!(!is_urgent("plain text", &[date_in(10)], now(), &lexicon));
        assert!(!is_urgent("plain text", &[], now(), &lexicon));
    }

    #[test]
    fn earliest_date_decides() {
        let lexicon = Lexicon::default();
        assert!(is_urgent(
            "plain text",
            &[date_in(30), date_in(2)],
            now(),
            &lexicon
        ));
    }

    #[test]
    fn item_urgency_ignores_fallback_dates() {
        let lexicon = Lexicon::default();
        assert!(!is_item_urgent(&ContextItem::new("lovely weather"), now(), &lexicon));
        assert!(is_item_urgent(&ContextItem::new("see you Friday"), now(), &lexicon));
        assert!(!is_item_urgent(
            &ContextItem::new("conference on 2025-06-01"),
            now(),
            &lexicon
        ));
    }
}
