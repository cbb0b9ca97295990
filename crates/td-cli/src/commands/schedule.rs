//! Schedule command: conflict-free placements for every task in `tasks`.

use std::io::Write;

use anyhow::{Context, Result};
use td_core::{Placement, SlotConfig, Timestamp, schedule_tasks};

use super::input::Snapshot;
use super::util::write_json;

pub fn run<W: Write>(
    writer: &mut W,
    snapshot: &Snapshot,
    config: &SlotConfig,
    now: Timestamp,
) -> Result<()> {
    let scheduled = schedule_tasks(&snapshot.tasks, &snapshot.busy, config, now)
        .context("cannot schedule tasks")?;
    let infeasible = scheduled
        .iter()
        .filter(|s| s.placement == Placement::Infeasible)
        .count();
    if infeasible > 0 {
        tracing::warn!(infeasible, "some tasks could not be placed inside the horizon");
    }
    write_json(writer, &scheduled)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    fn run_on(json: &str) -> Result<Value> {
        let snapshot = Snapshot::parse(json)?;
        let mut output = Vec::new();
        run(&mut output, &snapshot, &SlotConfig::default(), snapshot.now.unwrap())?;
        Ok(serde_json::from_slice(&output)?)
    }

    #[test]
    fn urgent_work_goes_first() {
        let result = run_on(
            r#"{"now": "2025-01-13T10:00:00+02:00",
                "tasks": [
                  {"title": "Tidy notes", "priority": "low"},
                  {"title": "Fix outage", "priority": "urgent", "estimatedDurationMinutes": 30}
                ]}"#,
        )
        .unwrap();
        let rows: Vec<(&str, &str, &str)> = result
            .as_array()
            .unwrap()
            .iter()
            .map(|row| {
                (
                    row["task"]["title"].as_str().unwrap(),
                    row["interval"]["start"].as_str().unwrap(),
                    row["placement"].as_str().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Fix outage", "2025-01-13T11:00:00+02:00", "scheduled"),
                ("Tidy notes", "2025-01-16T10:00:00+02:00", "scheduled"),
            ]
        );
        assert_eq!(result[0]["interval"]["label"], "Fix outage");
    }

    #[test]
    fn empty_task_list_is_an_error() {
        let err = run_on(r#"{"now": "2025-01-13T10:00:00+02:00"}"#).unwrap_err();
        assert_eq!(format!("{err:#}"), "cannot schedule tasks: no tasks to schedule");
    }
}
