//! Priority reconciliation.
//!
//! Combines an optional external score with a complexity heuristic and
//! deadline signals found in context. The order of the rules matters:
//!
//! 1. Start from the suggested score when it is well-formed, else 5.0.
//! 2. If the task text matches a force-low phrase, pin the score at 2.5 and
//!    stop. Nothing later may raise it.
//! 3. Otherwise escalate by the distance to the earliest context date. The
//!    two nearest tiers force their label even over a higher score.
//! 4. Derive the label from the final score unless a tier decided it.

use tracing::debug;

use crate::calendar::days_until;
use crate::lexicon::Lexicon;
use crate::suggestion::{PrioritySuggestion, SuggestionProvider};
use crate::temporal::{earliest, extract_dates};
use crate::types::{Confidence, ContextItem, PriorityLabel, PriorityResult, TaskFacts, Timestamp};
use crate::urgency::is_item_urgent;

const DEFAULT_SCORE: f64 = 5.0;
const FORCED_LOW_SCORE: f64 = 2.5;
const MAX_SCORE: f64 = 10.0;

const FORCED_LOW_NOTE: &str = "This is a simple task that should be low priority.";
const DEFAULT_REASONING: &str = "No external suggestion available; scored from task attributes and context.";
const URGENT_CONTEXT_FACTOR: &str = "Urgent context detected";

/// How an escalation tier decides the label.
#[derive(Debug, Clone, Copy)]
enum LabelRule {
    Force(PriorityLabel),
    /// High when the escalated score reaches the threshold, else from the score.
    HighAtOrAbove(f64),
    FromScore,
}

impl LabelRule {
    fn apply(self, score: f64) -> PriorityLabel {
        match self {
            Self::Force(label) => label,
            Self::HighAtOrAbove(threshold) if score >= threshold => PriorityLabel::High,
            Self::HighAtOrAbove(_) | Self::FromScore => PriorityLabel::from_score(score),
        }
    }
}

/// One row of the escalation table.
struct Escalation {
    within_days: f64,
    floor: f64,
    label: LabelRule,
    relevance: f32,
    factor: &'static str,
    note: Option<&'static str>,
}

const ESCALATIONS: [Escalation; 4] = [
    Escalation {
        within_days: 1.0,
        floor: 9.5,
        label: LabelRule::Force(PriorityLabel::Critical),
        relevance: 0.98,
        factor: "Critical deadline detected within 24 hours",
        note: Some("Priority elevated to Critical due to a deadline within 24 hours"),
    },
    Escalation {
        within_days: 2.0,
        floor: 8.5,
        label: LabelRule::Force(PriorityLabel::High),
        relevance: 0.9,
        factor: "Urgent deadline within 48 hours",
        note: Some("Priority adjusted due to a deadline within 48 hours"),
    },
    Escalation {
        within_days: 4.0,
        floor: 7.5,
        label: LabelRule::HighAtOrAbove(7.0),
        relevance: 0.8,
        factor: "Upcoming deadline within 4 days",
        note: None,
    },
    Escalation {
        within_days: 7.0,
        floor: 6.5,
        label: LabelRule::FromScore,
        relevance: 0.7,
        factor: "Upcoming deadline within a week",
        note: None,
    },
];

fn hits(terms: &[String], lowered: &str) -> f64 {
    f64::from(u32::try_from(Lexicon::count_hits(terms, lowered)).unwrap_or(u32::MAX))
}

/// Complexity heuristic in \[0, 10\] from the task's title and description.
///
/// Each complexity term adds `complexity_weight`, each simplicity term
/// removes `simplicity_weight`. A strong-simplicity phrase caps the result.
pub fn complexity_score(task: &TaskFacts, lexicon: &Lexicon) -> f64 {
    let text = task.searchable_text();
    let raw = lexicon.complexity_weight.mul_add(
        hits(&lexicon.complexity_terms, &text),
        -lexicon.simplicity_weight * hits(&lexicon.simplicity_terms, &text),
    );
    let score = raw.clamp(0.0, MAX_SCORE);
    if Lexicon::first_hit(&lexicon.strong_simplicity_phrases, &text).is_some() {
        score.min(lexicon.strong_simplicity_cap)
    } else {
        score
    }
}

/// Reconciles a task's priority using whatever the provider suggests.
pub fn reconcile_priority_with(
    task: &TaskFacts,
    context: &[ContextItem],
    provider: &dyn SuggestionProvider,
    now: Timestamp,
    lexicon: &Lexicon,
) -> PriorityResult {
    let suggestion = provider.priority_suggestion(task);
    reconcile_priority(task, context, suggestion.as_ref(), now, lexicon)
}

/// Reconciles a task's priority. Always returns a result; a missing or
/// partially malformed suggestion only changes the starting point.
pub fn reconcile_priority(
    task: &TaskFacts,
    context: &[ContextItem],
    suggestion: Option<&PrioritySuggestion>,
    now: Timestamp,
    lexicon: &Lexicon,
) -> PriorityResult {
    let complexity = complexity_score(task, lexicon);
    let mut score = suggestion
        .and_then(|s| s.score)
        .filter(|s| s.is_finite())
        .map_or(DEFAULT_SCORE, |s| s.clamp(0.0, MAX_SCORE));
    let mut relevance = suggestion
        .and_then(|s| s.context_relevance)
        .unwrap_or_default();
    let mut factors = suggestion
        .map(|s| s.urgency_factors.clone())
        .unwrap_or_default();
    let mut reasoning = suggestion
        .and_then(|s| s.reasoning.clone())
        .unwrap_or_else(|| DEFAULT_REASONING.to_string());

    let mut label_rule = LabelRule::FromScore;
    let text = task.searchable_text();
    if let Some(phrase) = Lexicon::first_hit(&lexicon.force_low_phrases, &text) {
        debug!(title = %task.title, phrase, "forcing low priority for simple task");
        score = FORCED_LOW_SCORE;
        reasoning = format!("{FORCED_LOW_NOTE} {reasoning}");
    } else if !context.is_empty() {
        let dates = extract_dates(context, now, lexicon);
        if let Some(date) = earliest(&dates) {
            let days = days_until(date.timestamp, now);
            if let Some(rule) = ESCALATIONS.iter().find(|rule| days < rule.within_days) {
                debug!(
                    title = %task.title,
                    days,
                    floor = rule.floor,
                    "escalating priority from context date"
                );
                score = score.max(rule.floor);
                label_rule = rule.label;
                relevance = relevance.max(Confidence::clamped(rule.relevance));
                factors.push(rule.factor.to_string());
                if let Some(note) = rule.note {
                    reasoning.push_str(&format!("\n({note})"));
                }
            }
        }
    }

    if context.iter().any(|item| is_item_urgent(item, now, lexicon)) {
        factors.push(URGENT_CONTEXT_FACTOR.to_string());
    }

    let score = score.clamp(0.0, MAX_SCORE);
    let label = label_rule.apply(score);
    if let Some(suggested) = suggestion.and_then(|s| s.label) {
        if suggested != label {
            debug!(%suggested, %label, score, "suggested label disagrees with score");
        }
    }

    PriorityResult {
        score,
        label,
        reasoning,
        urgency_factors: factors,
        context_relevance: relevance,
        complexity,
    }
}
