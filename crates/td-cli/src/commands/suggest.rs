//! Suggest command: one placement for `task`, with alternatives.

use std::io::Write;

use anyhow::{Context, Result};
use td_core::{SlotConfig, SuggestionProvider, Timestamp, suggest_schedule_with};

use super::input::Snapshot;
use super::util::write_json;

pub fn run<W: Write>(
    writer: &mut W,
    snapshot: &Snapshot,
    provider: &dyn SuggestionProvider,
    config: &SlotConfig,
    now: Timestamp,
) -> Result<()> {
    let task = snapshot.require_task()?;
    let suggestion = suggest_schedule_with(task, &snapshot.busy, provider, config, now)
        .with_context(|| format!("cannot schedule {:?}", task.title))?;
    write_json(writer, &suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    fn run_on(json: &str) -> Value {
        let snapshot = Snapshot::parse(json).unwrap();
        let mut output = Vec::new();
        run(
            &mut output,
            &snapshot,
            &snapshot.suggestion,
            &SlotConfig::default(),
            snapshot.now.unwrap(),
        )
        .unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn high_priority_task_starts_within_the_hour() {
        let result = run_on(
            r#"{"now": "2025-01-13T10:00:00+02:00",
                "task": {"title": "Patch release", "priority": "high"}}"#,
        );
        assert_eq!(result["start"], "2025-01-13T11:00:00+02:00");
        assert_eq!(result["end"], "2025-01-13T12:00:00+02:00");
        assert_eq!(result["confidence"], json!(0.8));
        assert_eq!(
            result["reasoning"],
            "Scheduled based on priority (high) and available time slots."
        );
        assert_eq!(
            result["alternatives"],
            json!([
                {"start": "2025-01-13T12:00:00+02:00", "end": "2025-01-13T13:00:00+02:00",
                 "label": "Patch release"},
                {"start": "2025-01-13T13:00:00+02:00", "end": "2025-01-13T14:00:00+02:00",
                 "label": "Patch release"}
            ])
        );
    }

    #[test]
    fn weekend_hint_is_replaced() {
        let result = run_on(
            r#"{"now": "2025-01-13T10:00:00+02:00",
                "task": {"title": "Patch release", "priority": "high"},
                "suggestion": {"schedule": {"start": "2025-01-18T10:00:00"}}}"#,
        );
        assert_eq!(result["start"], "2025-01-13T11:00:00+02:00");
        assert!(
            result["reasoning"]
                .as_str()
                .unwrap()
                .starts_with("Suggested slot discarded because it falls outside working hours.")
        );
    }

    #[test]
    fn valid_hint_is_kept() {
        let result = run_on(
            r#"{"now": "2025-01-13T10:00:00+02:00",
                "task": {"title": "Patch release", "priority": "high"},
                "suggestion": {"schedule": {
                    "start": "2025-01-14T14:00:00+02:00",
                    "end": "2025-01-14T15:00:00+02:00",
                    "confidence": 0.75,
                    "reasoning": "Afternoon is quiet."}}}"#,
        );
        assert_eq!(result["start"], "2025-01-14T14:00:00+02:00");
        assert_eq!(result["confidence"], json!(0.75));
        assert_eq!(result["reasoning"], "Afternoon is quiet.");
    }
}
