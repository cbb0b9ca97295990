//! Core type definitions shared by the extraction, reconciliation and
//! scheduling modules.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An instant on the caller's clock.
///
/// The offset of the `now` value handed to the core defines what "midnight",
/// "working hours" and "weekday" mean for that call.
pub type Timestamp = DateTime<FixedOffset>;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The priority string did not name a known user priority.
    #[error("unknown priority: {value}")]
    UnknownPriority { value: String },

    /// The label string did not name a known priority label.
    #[error("unknown priority label: {value}")]
    UnknownLabel { value: String },
}

/// Priority the user assigned to a task when creating it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl UserPriority {
    /// String representation used in prompts and output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Ordering rank used by the batch scheduler. Medium and low share a rank.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Urgent => 3,
            Self::High => 2,
            Self::Medium | Self::Low => 1,
        }
    }
}

impl fmt::Display for UserPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ValidationError::UnknownPriority {
                value: s.to_string(),
            }),
        }
    }
}

/// Coarse priority bucket derived from a 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriorityLabel {
    VeryLow,
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLabel {
    /// Maps a score onto the label table: `>=9` Critical, `>=7` High,
    /// `>=5` Medium, `>=2` Low, otherwise `VeryLow`.
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            Self::Critical
        } else if score >= 7.0 {
            Self::High
        } else if score >= 5.0 {
            Self::Medium
        } else if score >= 2.0 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    /// Human-readable form ("Very Low", "Critical", ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for PriorityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityLabel {
    type Err = ValidationError;

    /// Lenient parse: case, spaces, dashes and underscores are ignored so
    /// "Very Low", "very_low" and "VeryLow" all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "verylow" => Ok(Self::VeryLow),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" | "urgent" => Ok(Self::Critical),
            _ => Err(ValidationError::UnknownLabel {
                value: s.to_string(),
            }),
        }
    }
}

/// A confidence score in the range \[0.0, 1.0\].
///
/// Values are clamped on construction and deserialization so external data
/// can never push a result outside the range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f32);

impl Confidence {
    /// The maximum confidence value (1.0).
    pub const MAX: Self = Self(1.0);

    /// The minimum confidence value (0.0).
    pub const MIN: Self = Self(0.0);

    /// Creates a confidence value, clamping to \[0.0, 1.0\].
    ///
    /// NaN values become 0.0.
    #[must_use]
    pub const fn clamped(value: f32) -> Self {
        if value.is_nan() || value < 0.0 {
            Self(0.0)
        } else if value > 1.0 {
            Self(1.0)
        } else {
            Self(value)
        }
    }

    /// Returns the inner f32 value.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Returns the larger of two confidences.
    #[must_use]
    pub const fn max(self, other: Self) -> Self {
        if other.0 > self.0 { other } else { self }
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Confidence> for f32 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl Serialize for Confidence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f32::deserialize(deserializer)?;
        Ok(Self::clamped(value))
    }
}

/// A timestamped snippet of free text (note, message, email).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextItem {
    pub text: String,
    #[serde(default)]
    pub occurred_at: Option<Timestamp>,
}

impl ContextItem {
    /// Creates an undated context item.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            occurred_at: None,
        }
    }
}

/// Which rule produced an [`ExtractedDate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKind {
    /// Taken from a context item's `occurred_at` field.
    Structured,
    /// ISO or month-name calendar date.
    Absolute,
    /// "tomorrow at 3pm" style phrase.
    TomorrowAt,
    /// Relative keyword such as "today", "next week" or a weekday name.
    Relative,
    /// Nothing was found; synthesized so callers always get a date.
    Fallback,
}

/// A calendar instant pulled out of free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDate {
    pub timestamp: Timestamp,
    pub source_text: String,
    pub kind: DateKind,
}

/// Read-only snapshot of a task supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFacts {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "priority")]
    pub user_priority: UserPriority,
    #[serde(default = "default_duration_minutes")]
    pub estimated_duration_minutes: i64,
    #[serde(default)]
    pub deadline: Option<Timestamp>,
}

const fn default_duration_minutes() -> i64 {
    60
}

impl TaskFacts {
    /// Creates a medium-priority, one-hour task with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            category: None,
            user_priority: UserPriority::Medium,
            estimated_duration_minutes: default_duration_minutes(),
            deadline: None,
        }
    }

    /// Lower-cased title and description joined by a space.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

/// Result of priority reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityResult {
    /// Final score in \[0, 10\].
    pub score: f64,
    pub label: PriorityLabel,
    pub reasoning: String,
    pub urgency_factors: Vec<String>,
    pub context_relevance: Confidence,
    /// Complexity heuristic in \[0, 10\] computed from the task text.
    pub complexity: f64,
}

/// Categories and tags already in use, supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vocabulary {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

/// Broad categories and specific tags proposed for a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    /// At most three, names already in use first.
    pub categories: Vec<String>,
    /// At most five, names already in use first.
    pub tags: Vec<String>,
    pub confidence: Confidence,
    pub reasoning: String,
}

/// Result of deadline reconciliation. `deadline` is always after the `now`
/// passed to the call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineResult {
    pub deadline: Timestamp,
    pub confidence: Confidence,
    pub reasoning: String,
    pub factors: Vec<String>,
}

/// A busy period: calendar event, time block, or a task placed earlier in the
/// same scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub start: Timestamp,
    pub end: Timestamp,
    #[serde(default)]
    pub label: String,
}

impl Interval {
    pub fn new(start: Timestamp, end: Timestamp, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// True if the half-open ranges `[start, end)` share any instant.
    pub fn overlaps(&self, start: Timestamp, end: Timestamp) -> bool {
        start < self.end && end > self.start
    }

    /// True if `end > start`.
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }
}

/// Placement proposed for a single task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSuggestion {
    pub start: Timestamp,
    pub end: Timestamp,
    pub confidence: Confidence,
    pub reasoning: String,
    pub alternatives: Vec<Interval>,
}

/// How a batch-scheduled task was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// A conflict-free slot inside working hours was found.
    Scheduled,
    /// No slot existed within the horizon; placed at the horizon boundary.
    Infeasible,
}

/// One element of the batch scheduler's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub task: TaskFacts,
    pub interval: Interval,
    pub placement: Placement,
    pub reasoning: String,
}
