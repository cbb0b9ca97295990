//! Optional external suggestions and lenient recovery of their payloads.
//!
//! Suggestions come from an outside advisor (usually a language model) and
//! are never trusted: every field is optional, numbers may arrive as
//! strings, and a field that fails to parse is treated as absent rather than
//! failing the whole payload. The reconcilers decide what to do with
//! whatever survives.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::types::{Confidence, PriorityLabel, TaskFacts};

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

/// Recovers a JSON object from free-form model output.
///
/// Tries, in order: the whole text, the first fenced code block, then each
/// balanced `{...}` span in the text. Only objects are returned.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Some(value) = parse_object(trimmed) {
        return Some(value);
    }

    if let Some(value) = FENCED_JSON_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_object(m.as_str()))
    {
        return Some(value);
    }

    balanced_spans(trimmed)
        .into_iter()
        .find_map(|(start, end)| parse_object(&trimmed[start..end]))
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Byte ranges of every balanced `{...}` span, ordered by start.
///
/// One pass with a stack of open braces. Quotes only open a string inside a
/// brace, and braces inside strings are ignored.
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push(idx),
            '}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, idx + 1));
                }
            }
            _ => {}
        }
    }
    spans.sort_unstable();
    spans
}

/// Normalizes a raw payload: strings are treated as model output and
/// searched for an embedded object.
fn as_object(value: &Value) -> Option<Value> {
    match value {
        Value::Object(_) => Some(value.clone()),
        Value::String(text) => extract_json_object(text),
        _ => None,
    }
}

fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| value.get(*name).filter(|v| !v.is_null()))
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(text).collect(),
        Some(other) => text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "confidence is clamped to [0, 1] immediately after the cast"
)]
fn confidence(value: Option<&Value>) -> Option<Confidence> {
    value
        .and_then(number)
        .map(|n| Confidence::clamped(n as f32))
}

/// An advisor's view of a task's priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrioritySuggestion {
    /// Score in \[0, 10\]. Out-of-range scores are dropped as malformed.
    pub score: Option<f64>,
    pub label: Option<PriorityLabel>,
    pub reasoning: Option<String>,
    pub urgency_factors: Vec<String>,
    pub context_relevance: Option<Confidence>,
}

impl PrioritySuggestion {
    /// Reads a suggestion from a raw payload, keeping the fields that parse.
    pub fn from_value(value: &Value) -> Self {
        let Some(value) = as_object(value) else {
            return Self::default();
        };
        Self {
            score: field(&value, &["score", "priority_score", "priorityScore"])
                .and_then(number)
                .filter(|s| (0.0..=10.0).contains(s)),
            label: field(&value, &["label", "priority_label", "priorityLabel"])
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            reasoning: field(&value, &["reasoning"]).and_then(text),
            urgency_factors: string_list(field(
                &value,
                &["urgency_factors", "urgencyFactors", "factors"],
            )),
            context_relevance: confidence(field(
                &value,
                &["context_relevance", "contextRelevance"],
            )),
        }
    }
}

/// An advisor's view of a task's deadline.
///
/// The deadline stays textual here; the reconciler parses it against the
/// caller's clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeadlineSuggestion {
    pub deadline: Option<String>,
    pub confidence: Option<Confidence>,
    pub reasoning: Option<String>,
    pub factors: Vec<String>,
}

impl DeadlineSuggestion {
    /// Reads a suggestion from a raw payload, keeping the fields that parse.
    pub fn from_value(value: &Value) -> Self {
        let Some(value) = as_object(value) else {
            return Self::default();
        };
        Self {
            deadline: field(
                &value,
                &["deadline", "suggested_deadline", "suggestedDeadline"],
            )
            .and_then(text),
            confidence: confidence(field(&value, &["confidence"])),
            reasoning: field(&value, &["reasoning"]).and_then(text),
            factors: string_list(field(
                &value,
                &["factors", "factors_considered", "factorsConsidered"],
            )),
        }
    }
}

/// A proposed start/end pair, still textual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintSlot {
    pub start: String,
    pub end: String,
}

/// An advisor's proposed placement for one task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleHint {
    pub start: Option<String>,
    pub end: Option<String>,
    pub confidence: Option<Confidence>,
    pub reasoning: Option<String>,
    pub alternatives: Vec<HintSlot>,
}

impl ScheduleHint {
    /// Reads a hint from a raw payload, keeping the fields that parse.
    pub fn from_value(value: &Value) -> Self {
        let Some(value) = as_object(value) else {
            return Self::default();
        };
        let alternatives = match field(&value, &["alternatives", "alternative_slots"]) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    Some(HintSlot {
                        start: field(item, &["start", "start_time", "startTime"]).and_then(text)?,
                        end: field(item, &["end", "end_time", "endTime"]).and_then(text)?,
                    })
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            start: field(&value, &["start", "start_time", "startTime"]).and_then(text),
            end: field(&value, &["end", "end_time", "endTime"]).and_then(text),
            confidence: confidence(field(&value, &["confidence"])),
            reasoning: field(&value, &["reasoning"]).and_then(text),
            alternatives,
        }
    }
}

/// An advisor's categories and tags for a task. Names are trimmed but not
/// yet matched against the vocabulary in use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySuggestion {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub confidence: Option<Confidence>,
    pub reasoning: Option<String>,
}

impl CategorySuggestion {
    /// Reads a suggestion from a raw payload, keeping the fields that parse.
    pub fn from_value(value: &Value) -> Self {
        let Some(value) = as_object(value) else {
            return Self::default();
        };
        Self {
            categories: string_list(field(
                &value,
                &["categories", "suggested_categories", "suggestedCategories"],
            )),
            tags: string_list(field(
                &value,
                &["tags", "suggested_tags", "suggestedTags"],
            )),
            confidence: confidence(field(&value, &["confidence"])),
            reasoning: field(&value, &["reasoning"]).and_then(text),
        }
    }
}

/// Source of optional suggestions consulted by the reconcilers.
///
/// Returning `None` means "no opinion"; the core then falls back to its own
/// heuristics.
pub trait SuggestionProvider {
    fn priority_suggestion(&self, task: &TaskFacts) -> Option<PrioritySuggestion>;

    fn deadline_suggestion(&self, task: &TaskFacts) -> Option<DeadlineSuggestion>;

    fn schedule_hint(&self, _task: &TaskFacts) -> Option<ScheduleHint> {
        None
    }

    fn category_suggestion(&self, _task: &TaskFacts) -> Option<CategorySuggestion> {
        None
    }
}

/// Provider that never has an opinion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuggestions;

impl SuggestionProvider for NoSuggestions {
    fn priority_suggestion(&self, _task: &TaskFacts) -> Option<PrioritySuggestion> {
        None
    }

    fn deadline_suggestion(&self, _task: &TaskFacts) -> Option<DeadlineSuggestion> {
        None
    }
}

/// Provider backed by pre-fetched raw payloads, answering the same for every
/// task.
///
/// Each payload may be a JSON object or a string of model output containing
/// one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StaticSuggestions {
    #[serde(default)]
    pub priority: Option<Value>,
    #[serde(default)]
    pub deadline: Option<Value>,
    #[serde(default)]
    pub schedule: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
}

impl SuggestionProvider for StaticSuggestions {
    fn priority_suggestion(&self, _task: &TaskFacts) -> Option<PrioritySuggestion> {
        self.priority.as_ref().map(PrioritySuggestion::from_value)
    }

    fn deadline_suggestion(&self, _task: &TaskFacts) -> Option<DeadlineSuggestion> {
        self.deadline.as_ref().map(DeadlineSuggestion::from_value)
    }

    fn schedule_hint(&self, _task: &TaskFacts) -> Option<ScheduleHint> {
        self.schedule.as_ref().map(ScheduleHint::from_value)
    }

    fn category_suggestion(&self, _task: &TaskFacts) -> Option<CategorySuggestion> {
        self.category.as_ref().map(CategorySuggestion::from_value)
    }
}
