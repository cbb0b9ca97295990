//! Sequential placement of many tasks.

use std::cmp::Reverse;

use chrono::Duration;
use tracing::{debug, warn};

use crate::slot::{
    INFEASIBLE_REASONING, ScheduleError, SlotConfig, SlotOutcome, checked_end, earliest_start_for,
    find_slot, validate_duration,
};
use crate::types::{Interval, Placement, ScheduledTask, TaskFacts, Timestamp};

/// Places every task, highest priority and nearest deadline first.
///
/// Each placement joins a private copy of `busy` so later tasks never
/// collide with earlier ones; the caller's slice is not touched. A task
/// that fits nowhere inside the horizon is still placed, at the horizon
/// boundary, and marked [`Placement::Infeasible`]. Output is deterministic
/// for identical inputs.
pub fn schedule_tasks(
    tasks: &[TaskFacts],
    busy: &[Interval],
    config: &SlotConfig,
    now: Timestamp,
) -> Result<Vec<ScheduledTask>, ScheduleError> {
    if tasks.is_empty() {
        return Err(ScheduleError::NoTasks);
    }
    for task in tasks {
        validate_duration(task.estimated_duration_minutes)?;
    }

    let mut ordered: Vec<&TaskFacts> = tasks.iter().collect();
    // Stable, so equal keys keep input order. `None` sorts after `Some`.
    ordered.sort_by_key(|t| (Reverse(t.user_priority.rank()), t.deadline.is_none(), t.deadline));

    let mut taken = busy.to_vec();
    let mut scheduled = Vec::with_capacity(tasks.len());
    for task in ordered {
        let earliest = earliest_start_for(task, now);
        let (interval, placement, reasoning) =
            match find_slot(task.estimated_duration_minutes, earliest, &taken, config, now)? {
                SlotOutcome::Found(slot) => {
                    debug!(title = %task.title, start = %slot.start, "placed task");
                    (
                        slot,
                        Placement::Scheduled,
                        format!(
                            "Scheduled based on priority ({}) and available time slots.",
                            task.user_priority
                        ),
                    )
                }
                SlotOutcome::NotFound { horizon_end } => {
                    warn!(title = %task.title, %horizon_end, "no conflict-free slot, placing at horizon");
                    let duration = validate_duration(task.estimated_duration_minutes)?;
                    (
                        past_overlaps(horizon_end, duration, &scheduled)?,
                        Placement::Infeasible,
                        INFEASIBLE_REASONING.to_string(),
                    )
                }
            };
        let interval = Interval {
            label: task.title.clone(),
            ..interval
        };
        taken.push(interval.clone());
        scheduled.push(ScheduledTask {
            task: task.clone(),
            interval,
            placement,
            reasoning,
        });
    }
    Ok(scheduled)
}

/// Moves a forced placement past any earlier output it would overlap.
fn past_overlaps(
    start: Timestamp,
    duration: Duration,
    placed: &[ScheduledTask],
) -> Result<Interval, ScheduleError> {
    let mut start = start;
    let mut end = checked_end(start, duration)?;
    while let Some(clash) = placed.iter().find(|p| p.interval.overlaps(start, end)) {
        start = clash.interval.end;
        end = checked_end(start, duration)?;
    }
    Ok(Interval::new(start, end, ""))
}
