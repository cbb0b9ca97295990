//! Workload summary over a set of open tasks.

use std::fmt;

use chrono::Duration;
use serde::Serialize;

use crate::types::{TaskFacts, Timestamp, UserPriority};

/// Coarse load bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl WorkloadLevel {
    /// Buckets a load score: `>=8` very high, `>=6` high, `>=3` medium.
    pub const fn from_score(score: u32) -> Self {
        match score {
            8.. => Self::VeryHigh,
            6..=7 => Self::High,
            3..=5 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for WorkloadLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSummary {
    pub total: usize,
    pub high: usize,
    pub urgent: usize,
    /// Deadline already passed.
    pub overdue: usize,
    /// Deadline within the next seven days.
    pub upcoming_week: usize,
    pub estimated_hours: f64,
    pub level: WorkloadLevel,
}

/// Points for `value` given `(exclusive threshold, points)` rows, highest
/// threshold first.
fn tier(value: f64, rows: &[(f64, u32)]) -> u32 {
    rows.iter()
        .find(|(threshold, _)| value > *threshold)
        .map_or(0, |(_, points)| *points)
}

fn as_f64(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Load score from task count, urgent count, overdue count and hours.
/// Overdue work weighs heaviest.
pub fn load_score(total: usize, urgent: usize, overdue: usize, hours: f64) -> u32 {
    tier(as_f64(total), &[(20.0, 3), (10.0, 2), (5.0, 1)])
        + tier(as_f64(urgent), &[(5.0, 3), (2.0, 2), (0.0, 1)])
        + tier(as_f64(overdue), &[(3.0, 4), (1.0, 3), (0.0, 2)])
        + tier(hours, &[(40.0, 3), (20.0, 2), (10.0, 1)])
}

/// Summarizes the load that `tasks` represent at `now`.
pub fn assess_workload(tasks: &[TaskFacts], now: Timestamp) -> WorkloadSummary {
    let week_ahead = now + Duration::days(7);
    let count = |pred: &dyn Fn(&TaskFacts) -> bool| tasks.iter().filter(|t| pred(t)).count();

    let total = tasks.len();
    let high = count(&|t| t.user_priority == UserPriority::High);
    let urgent = count(&|t| t.user_priority == UserPriority::Urgent);
    let overdue = count(&|t| t.deadline.is_some_and(|d| d < now));
    let upcoming_week = count(&|t| t.deadline.is_some_and(|d| d >= now && d <= week_ahead));
    let minutes: i64 = tasks
        .iter()
        .map(|t| t.estimated_duration_minutes.max(0))
        .sum();
    let estimated_hours = f64::from(i32::try_from(minutes).unwrap_or(i32::MAX)) / 60.0;

    WorkloadSummary {
        total,
        high,
        urgent,
        overdue,
        upcoming_week,
        estimated_hours,
        level: WorkloadLevel::from_score(load_score(total, urgent, overdue, estimated_hours)),
    }
}
