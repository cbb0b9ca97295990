//! Conflict-free slot search over working hours.
//!
//! The search is a greedy forward scan: clamp the cursor into working time,
//! try to fit the task, and on the first conflicting busy interval jump to
//! its end. Every returned slot starts and ends inside one working day, on a
//! weekday when weekends are skipped, and overlaps no busy interval.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use thiserror::Error;
use tracing::{debug, trace};

use crate::calendar::{at_local, parse_timestamp};
use crate::suggestion::{HintSlot, ScheduleHint, SuggestionProvider};
use crate::types::{Confidence, Interval, ScheduleSuggestion, TaskFacts, Timestamp, UserPriority};

/// Caller misuse rejected at the API boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Task durations must be at least one minute.
    #[error("duration must be positive, got {minutes} minutes")]
    NonPositiveDuration { minutes: i64 },

    /// The working day must start before it ends.
    #[error("working hours start ({start}) must be before end ({end})")]
    InvalidWorkingHours { start: NaiveTime, end: NaiveTime },

    #[error("search horizon must be at least one day")]
    ZeroHorizon,

    #[error("no tasks to schedule")]
    NoTasks,

    /// Duration or horizon reaches past the calendar chrono can represent.
    #[error("scheduling window is outside the supported date range")]
    OutOfRange,
}

/// Working-time constraints for the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConfig {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    /// How far past the earliest start the search may go.
    pub horizon_days: u32,
    pub skip_weekends: bool,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            work_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            horizon_days: 14,
            skip_weekends: true,
        }
    }
}

impl SlotConfig {
    fn validate(&self) -> Result<(), ScheduleError> {
        if self.work_start >= self.work_end {
            return Err(ScheduleError::InvalidWorkingHours {
                start: self.work_start,
                end: self.work_end,
            });
        }
        if self.horizon_days == 0 {
            return Err(ScheduleError::ZeroHorizon);
        }
        Ok(())
    }

    fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.skip_weekends || !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// First working instant at or after `t`, on `t`'s clock.
    pub fn next_working_instant(&self, t: Timestamp) -> Timestamp {
        let offset = *t.offset();
        let mut date = t.date_naive();
        let mut candidate = if t.time() < self.work_start {
            at_local(offset, date, self.work_start)
        } else if t.time() >= self.work_end {
            date += Duration::days(1);
            at_local(offset, date, self.work_start)
        } else {
            t
        };
        while !self.is_working_day(date) {
            date += Duration::days(1);
            candidate = at_local(offset, date, self.work_start);
        }
        candidate
    }

    /// True if `[start, end)` lies inside one working day.
    pub fn contains(&self, start: Timestamp, end: Timestamp) -> bool {
        let end = end.with_timezone(start.offset());
        let day_end = at_local(*start.offset(), start.date_naive(), self.work_end);
        self.is_working_day(start.date_naive())
            && start.time() >= self.work_start
            && start < end
            && end <= day_end
    }
}

/// Outcome of a slot search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Found(Interval),
    /// Nothing fit before `horizon_end`.
    NotFound { horizon_end: Timestamp },
}

pub(crate) fn validate_duration(minutes: i64) -> Result<Duration, ScheduleError> {
    if minutes <= 0 {
        return Err(ScheduleError::NonPositiveDuration { minutes });
    }
    Duration::try_minutes(minutes).ok_or(ScheduleError::OutOfRange)
}

/// `start + duration`, or `OutOfRange` past the end of the calendar.
pub(crate) fn checked_end(start: Timestamp, duration: Duration) -> Result<Timestamp, ScheduleError> {
    start
        .checked_add_signed(duration)
        .ok_or(ScheduleError::OutOfRange)
}

/// Finds the earliest conflict-free slot of `duration_minutes` starting no
/// earlier than `max(now, earliest_start)`.
///
/// The horizon is counted from that same search start, so an earliest start
/// already in the past still gets the full window. Busy intervals with
/// `end <= start` are ignored. The returned interval is on `now`'s clock and
/// has an empty label.
pub fn find_slot(
    duration_minutes: i64,
    earliest_start: Timestamp,
    busy: &[Interval],
    config: &SlotConfig,
    now: Timestamp,
) -> Result<SlotOutcome, ScheduleError> {
    let duration = validate_duration(duration_minutes)?;
    config.validate()?;

    let offset = *now.offset();
    let search_start = now.max(earliest_start.with_timezone(&offset));
    // A spare week past the boundary lets the cursor roll over weekends.
    let horizon_end = Duration::try_days(i64::from(config.horizon_days))
        .and_then(|horizon| search_start.checked_add_signed(horizon))
        .filter(|end| end.checked_add_signed(Duration::weeks(1)).is_some())
        .ok_or(ScheduleError::OutOfRange)?;

    if duration > config.work_end - config.work_start {
        debug!(duration_minutes, "task is longer than a working day");
        return Ok(SlotOutcome::NotFound { horizon_end });
    }

    let mut cursor = config.next_working_instant(search_start);
    loop {
        if cursor > horizon_end {
            debug!(duration_minutes, %horizon_end, "no slot within horizon");
            return Ok(SlotOutcome::NotFound { horizon_end });
        }

        let end = cursor + duration;
        let day_end = at_local(offset, cursor.date_naive(), config.work_end);
        if end > day_end {
            trace!(%cursor, "task does not fit before end of day");
            cursor = config.next_working_instant(day_end);
            continue;
        }

        let conflict = busy.iter().find(|b| {
            if !b.is_valid() {
                trace!(label = %b.label, "skipping busy interval with end before start");
                return false;
            }
            b.overlaps(cursor, end)
        });
        match conflict {
            Some(b) if b.end > horizon_end => {
                debug!(label = %b.label, %horizon_end, "busy interval runs past the horizon");
                return Ok(SlotOutcome::NotFound { horizon_end });
            }
            Some(b) => {
                trace!(label = %b.label, %cursor, "slot conflicts with busy interval");
                cursor = config.next_working_instant(b.end.with_timezone(&offset));
            }
            None => return Ok(SlotOutcome::Found(Interval::new(cursor, end, ""))),
        }
    }
}

/// Earliest start implied by a task's priority, pulled earlier when the
/// deadline leaves too little lead time.
///
/// Urgent tasks share the high-priority offset.
pub fn earliest_start_for(task: &TaskFacts, now: Timestamp) -> Timestamp {
    let (offset_hours, lead_hours) = match task.user_priority {
        UserPriority::Urgent | UserPriority::High => (1, 24),
        UserPriority::Medium => (24, 48),
        UserPriority::Low => (72, 72),
    };
    let naive = now
        .checked_add_signed(Duration::hours(offset_hours))
        .unwrap_or(now);
    task.deadline
        .and_then(|deadline| {
            deadline
                .with_timezone(now.offset())
                .checked_sub_signed(Duration::hours(lead_hours))
        })
        .map_or(naive, |pulled| pulled.min(naive))
}

const HINT_DEFAULT_CONFIDENCE: f32 = 0.7;
const FIRST_CHOICE_CONFIDENCE: f32 = 0.8;
const DISPLACED_CONFIDENCE: f32 = 0.6;
const DEGRADED_CONFIDENCE: f32 = 0.3;
const MAX_ALTERNATIVES: usize = 2;

/// Reasoning attached to placements made without a conflict-free slot.
pub const INFEASIBLE_REASONING: &str = "no conflict-free slot found within the search horizon";

/// Why a suggested slot was rejected, or `None` if it is usable.
fn hint_problem(
    slot: &Interval,
    busy: &[Interval],
    config: &SlotConfig,
    now: Timestamp,
) -> Option<&'static str> {
    if slot.start <= now {
        Some("it starts in the past")
    } else if !config.contains(slot.start, slot.end) {
        Some("it falls outside working hours")
    } else if busy
        .iter()
        .any(|b| b.is_valid() && b.overlaps(slot.start, slot.end))
    {
        Some("it conflicts with an existing commitment")
    } else {
        None
    }
}

fn parse_hint_slot(
    start: Option<&str>,
    end: Option<&str>,
    duration: Duration,
    now: Timestamp,
) -> Option<Interval> {
    let offset = *now.offset();
    let start = parse_timestamp(start?, offset)?.with_timezone(&offset);
    let end = match end.and_then(|end| parse_timestamp(end, offset)) {
        Some(end) => end.with_timezone(&offset),
        None => start.checked_add_signed(duration)?,
    };
    Some(Interval::new(start, end, ""))
}

/// Proposes a placement for one task, optionally starting from an external
/// hint.
///
/// A hint is accepted only if it is in the future, inside working hours and
/// conflict-free; otherwise the slot search decides and the reasoning says
/// why the hint was dropped. When nothing fits inside the horizon the task
/// is placed at the horizon boundary with low confidence.
pub fn suggest_schedule(
    task: &TaskFacts,
    busy: &[Interval],
    hint: Option<&ScheduleHint>,
    config: &SlotConfig,
    now: Timestamp,
) -> Result<ScheduleSuggestion, ScheduleError> {
    let duration = validate_duration(task.estimated_duration_minutes)?;
    config.validate()?;
    let earliest = earliest_start_for(task, now);

    let mut notes = Vec::new();
    let hinted = hint.and_then(|hint| {
        let Some(slot) = parse_hint_slot(hint.start.as_deref(), hint.end.as_deref(), duration, now)
        else {
            notes.push("Suggested slot could not be parsed.".to_string());
            return None;
        };
        match hint_problem(&slot, busy, config, now) {
            Some(problem) => {
                debug!(title = %task.title, problem, "discarding suggested slot");
                notes.push(format!("Suggested slot discarded because {problem}."));
                None
            }
            None => Some((slot, hint)),
        }
    });

    let (chosen, confidence, reasoning) = if let Some((slot, hint)) = hinted {
        let confidence = hint
            .confidence
            .unwrap_or(Confidence::clamped(HINT_DEFAULT_CONFIDENCE));
        let reasoning = hint.reasoning.clone().unwrap_or_else(|| {
            "Suggested slot accepted: within working hours and conflict-free.".to_string()
        });
        (slot, confidence, reasoning)
    } else {
        match find_slot(task.estimated_duration_minutes, earliest, busy, config, now)? {
            SlotOutcome::Found(slot) => {
                let first_choice =
                    config.next_working_instant(now.max(earliest.with_timezone(now.offset())));
                let confidence = if slot.start == first_choice {
                    FIRST_CHOICE_CONFIDENCE
                } else {
                    DISPLACED_CONFIDENCE
                };
                let reasoning = format!(
                    "Scheduled based on priority ({}) and available time slots.",
                    task.user_priority
                );
                (slot, Confidence::clamped(confidence), reasoning)
            }
            SlotOutcome::NotFound { horizon_end } => (
                Interval::new(horizon_end, checked_end(horizon_end, duration)?, ""),
                Confidence::clamped(DEGRADED_CONFIDENCE),
                INFEASIBLE_REASONING.to_string(),
            ),
        }
    };

    let mut taken = busy.to_vec();
    taken.push(chosen.clone());
    let mut alternatives = Vec::new();
    for HintSlot { start, end } in hint.map_or(&[][..], |h| h.alternatives.as_slice()) {
        if alternatives.len() == MAX_ALTERNATIVES {
            break;
        }
        let Some(slot) =
            parse_hint_slot(Some(start.as_str()), Some(end.as_str()), duration, now)
        else {
            continue;
        };
        if hint_problem(&slot, &taken, config, now).is_none() {
            taken.push(slot.clone());
            alternatives.push(slot);
        }
    }
    while alternatives.len() < MAX_ALTERNATIVES {
        match find_slot(task.estimated_duration_minutes, earliest, &taken, config, now)? {
            SlotOutcome::Found(slot) => {
                taken.push(slot.clone());
                alternatives.push(slot);
            }
            SlotOutcome::NotFound { .. } => break,
        }
    }

    notes.push(reasoning);
    let label = task.title.clone();
    Ok(ScheduleSuggestion {
        start: chosen.start,
        end: chosen.end,
        confidence,
        reasoning: notes.join(" "),
        alternatives: alternatives
            .into_iter()
            .map(|slot| Interval { label: label.clone(), ..slot })
            .collect(),
    })
}

/// [`suggest_schedule`] with the hint taken from `provider`.
pub fn suggest_schedule_with(
    task: &TaskFacts,
    busy: &[Interval],
    provider: &dyn SuggestionProvider,
    config: &SlotConfig,
    now: Timestamp,
) -> Result<ScheduleSuggestion, ScheduleError> {
    let hint = provider.schedule_hint(task);
    suggest_schedule(task, busy, hint.as_ref(), config, now)
}
