//! Slot command: the earliest free slot for `task`.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use td_core::{SlotConfig, SlotOutcome, Timestamp, find_slot};

use super::input::Snapshot;
use super::util::write_json;

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum Rendered {
    Found { start: Timestamp, end: Timestamp },
    #[serde(rename_all = "camelCase")]
    NotFound { horizon_end: Timestamp },
}

impl From<SlotOutcome> for Rendered {
    fn from(outcome: SlotOutcome) -> Self {
        match outcome {
            SlotOutcome::Found(slot) => Self::Found {
                start: slot.start,
                end: slot.end,
            },
            SlotOutcome::NotFound { horizon_end } => Self::NotFound { horizon_end },
        }
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    snapshot: &Snapshot,
    earliest: Option<Timestamp>,
    config: &SlotConfig,
    now: Timestamp,
) -> Result<()> {
    let task = snapshot.require_task()?;
    let outcome = find_slot(
        task.estimated_duration_minutes,
        earliest.unwrap_or(now),
        &snapshot.busy,
        config,
        now,
    )
    .with_context(|| format!("cannot search a slot for {:?}", task.title))?;
    write_json(writer, &Rendered::from(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    const SNAPSHOT: &str = r#"{
        "now": "2025-01-13T10:00:00+02:00",
        "task": {"title": "Write summary", "estimatedDurationMinutes": 60},
        "busy": [{"start": "2025-01-13T10:00:00+02:00", "end": "2025-01-13T11:30:00+02:00",
                  "label": "planning"}]
    }"#;

    fn run_with(
        snapshot: &Snapshot,
        earliest: Option<Timestamp>,
        config: &SlotConfig,
    ) -> Result<String> {
        let mut output = Vec::new();
        run(&mut output, snapshot, earliest, config, snapshot.now.unwrap())?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn finds_slot_after_busy_block() {
        let snapshot = Snapshot::parse(SNAPSHOT).unwrap();
        let output = run_with(&snapshot, None, &SlotConfig::default()).unwrap();
        assert_snapshot!(output, @r#"
        {
          "outcome": "found",
          "start": "2025-01-13T11:30:00+02:00",
          "end": "2025-01-13T12:30:00+02:00"
        }
        "#);
    }

    #[test]
    fn earliest_pushes_search_forward() {
        let snapshot = Snapshot::parse(SNAPSHOT).unwrap();
        let earliest = chrono::DateTime::parse_from_rfc3339("2025-01-14T13:15:00+02:00").unwrap();
        let output = run_with(&snapshot, Some(earliest), &SlotConfig::default()).unwrap();
        assert_snapshot!(output, @r#"
        {
          "outcome": "found",
          "start": "2025-01-14T13:15:00+02:00",
          "end": "2025-01-14T14:15:00+02:00"
        }
        "#);
    }

    #[test]
    fn reports_horizon_when_nothing_fits() {
        let snapshot = Snapshot::parse(
            r#"{"now": "2025-01-13T10:00:00+02:00",
                "task": {"title": "Offsite", "estimatedDurationMinutes": 600}}"#,
        )
        .unwrap();
        let config = SlotConfig {
            horizon_days: 2,
            ..SlotConfig::default()
        };
        let output = run_with(&snapshot, None, &config).unwrap();
        assert_snapshot!(output, @r#"
        {
          "outcome": "not_found",
          "horizonEnd": "2025-01-15T10:00:00+02:00"
        }
        "#);
    }

    #[test]
    fn non_positive_duration_is_an_error() {
        let snapshot = Snapshot::parse(
            r#"{"now": "2025-01-13T10:00:00+02:00",
                "task": {"title": "Nothing", "estimatedDurationMinutes": 0}}"#,
        )
        .unwrap();
        let err = run_with(&snapshot, None, &SlotConfig::default()).unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "cannot search a slot for \"Nothing\": duration must be positive, got 0 minutes"
        );
    }
}
