//! Deadline reconciliation.
//!
//! The returned deadline is always strictly after `now`: a past suggestion
//! is replaced, context dates only pull the deadline toward future dates,
//! and a final guard catches anything else.

use chrono::Duration;
use tracing::debug;

use crate::calendar::{days_until, parse_timestamp};
use crate::lexicon::Lexicon;
use crate::suggestion::{DeadlineSuggestion, SuggestionProvider};
use crate::temporal::{earliest, extract_dates};
use crate::types::{Confidence, ContextItem, DeadlineResult, TaskFacts, Timestamp};

const DEFAULT_LEAD_DAYS: i64 = 7;
const DEFAULT_CONFIDENCE: f32 = 0.5;
/// Confidence assumed for a parsed suggestion that states none.
const SUGGESTED_CONFIDENCE: f32 = 0.7;
const ALIGNED_CONFIDENCE: f32 = 0.9;
const IMMINENT_CONFIDENCE: f32 = 0.98;
const PROXIMITY_CONFIDENCE: f32 = 0.85;

const PAST_CORRECTION_NOTE: &str =
    "[System correction: the suggested date was in the past. Adjusted to 7 days from now.]";
const DEFAULT_REASONING: &str = "No usable deadline suggestion; using the default of 7 days from now.";
const SYSTEM_CORRECTION_FACTOR: &str = "System correction applied";
const ALIGNMENT_FACTOR: &str = "Context date alignment";
const PROXIMITY_FACTOR: &str = "Context date proximity adjustment";

/// Reconciles a task's deadline using whatever the provider suggests.
pub fn reconcile_deadline_with(
    task: &TaskFacts,
    context: &[ContextItem],
    provider: &dyn SuggestionProvider,
    now: Timestamp,
    lexicon: &Lexicon,
) -> DeadlineResult {
    let suggestion = provider.deadline_suggestion(task);
    reconcile_deadline(task, context, suggestion.as_ref(), now, lexicon)
}

/// Reconciles a task's deadline against its context.
pub fn reconcile_deadline(
    task: &TaskFacts,
    context: &[ContextItem],
    suggestion: Option<&DeadlineSuggestion>,
    now: Timestamp,
    lexicon: &Lexicon,
) -> DeadlineResult {
    let default_deadline = now + Duration::days(DEFAULT_LEAD_DAYS);
    let parsed = suggestion.and_then(|s| {
        s.deadline
            .as_deref()
            .and_then(|text| parse_timestamp(text, *now.offset()))
    });
    let mut factors = suggestion.map(|s| s.factors.clone()).unwrap_or_default();
    let suggested_reasoning = suggestion.and_then(|s| s.reasoning.clone());

    let (mut deadline, mut confidence, mut reasoning) = match parsed {
        Some(suggested) if suggested <= now => {
            debug!(title = %task.title, %suggested, "replacing past deadline suggestion");
            factors.push(SYSTEM_CORRECTION_FACTOR.to_string());
            let reasoning = match suggested_reasoning {
                Some(original) => format!("{PAST_CORRECTION_NOTE} {original}"),
                None => PAST_CORRECTION_NOTE.to_string(),
            };
            (
                default_deadline,
                suggestion
                    .and_then(|s| s.confidence)
                    .unwrap_or(Confidence::clamped(DEFAULT_CONFIDENCE)),
                reasoning,
            )
        }
        Some(suggested) => (
            suggested,
            suggestion
                .and_then(|s| s.confidence)
                .unwrap_or(Confidence::clamped(SUGGESTED_CONFIDENCE)),
            suggested_reasoning.unwrap_or_default(),
        ),
        None => (
            default_deadline,
            Confidence::clamped(DEFAULT_CONFIDENCE),
            DEFAULT_REASONING.to_string(),
        ),
    };

    let dates = extract_dates(context, now, lexicon);
    let future = dates
        .into_iter()
        .filter(|date| date.timestamp > now)
        .collect::<Vec<_>>();
    if let Some(date) = earliest(&future) {
        let target = date.timestamp;
        let days = days_until(target, now);
        let label = target.format("%Y-%m-%d");
        if days < 2.0 || (days < 7.0 && confidence.value() < PROXIMITY_CONFIDENCE) {
            debug!(title = %task.title, %target, days, "aligning deadline with context date");
            deadline = target;
            confidence = Confidence::clamped(if days < 2.0 {
                IMMINENT_CONFIDENCE
            } else {
                ALIGNED_CONFIDENCE
            });
            reasoning.push_str(&format!(
                "\n(Deadline aligned with important date: {label})"
            ));
            factors.push(ALIGNMENT_FACTOR.to_string());
        } else if days < 7.0 && deadline > target + Duration::days(1) {
            debug!(title = %task.title, %target, days, "pulling deadline toward context date");
            deadline = target + Duration::days(1);
            confidence = confidence.max(Confidence::clamped(PROXIMITY_CONFIDENCE));
            reasoning.push_str(&format!(
                "\n(Deadline moved closer to important date: {label})"
            ));
            factors.push(PROXIMITY_FACTOR.to_string());
        }
    }

    if deadline <= now {
        deadline = default_deadline;
    }

    DeadlineResult {
        deadline,
        confidence,
        reasoning: reasoning.trim().to_string(),
        factors,
    }
}
