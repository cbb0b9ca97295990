//! Snapshot input shared by every command.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use td_core::{ContextItem, Interval, StaticSuggestions, TaskFacts, Timestamp, Vocabulary};

/// Everything a command may read, supplied by the caller as one JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub now: Option<Timestamp>,
    pub task: Option<TaskFacts>,
    pub tasks: Vec<TaskFacts>,
    pub context: Vec<ContextItem>,
    pub busy: Vec<Interval>,
    /// Categories and tags already in use.
    pub vocabulary: Vocabulary,
    /// Raw suggestion payloads captured before the run.
    pub suggestion: StaticSuggestions,
}

impl Snapshot {
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text).context("invalid snapshot JSON")
    }

    /// Reads from `path`, or stdin when `None`.
    pub fn read(path: Option<&Path>) -> Result<Self> {
        let text = match path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read snapshot from stdin")?;
                text
            }
        };
        Self::parse(&text)
    }

    /// `now` from the command line, else the snapshot, else `fallback`.
    pub fn resolve_now(
        &self,
        cli_now: Option<Timestamp>,
        fallback: impl FnOnce() -> Timestamp,
    ) -> Timestamp {
        cli_now.or(self.now).unwrap_or_else(fallback)
    }

    pub fn require_task(&self) -> Result<&TaskFacts> {
        match &self.task {
            Some(task) => Ok(task),
            None => bail!("snapshot has no \"task\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn parses_camel_case_snapshot() {
        let snapshot = Snapshot::parse(
            r#"{
                "now": "2025-01-13T10:00:00+02:00",
                "task": {"title": "Report", "estimatedDurationMinutes": 30},
                "context": [{"text": "due friday", "occurredAt": "2025-01-12T09:00:00Z"}],
                "busy": [{"start": "2025-01-13T09:00:00+02:00", "end": "2025-01-13T10:00:00+02:00"}],
                "vocabulary": {"tags": ["finance"]},
                "suggestion": {"priority": {"score": 8}}
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.task.as_ref().unwrap().estimated_duration_minutes, 30);
        assert!(snapshot.context[0].occurred_at.is_some());
        assert_eq!(snapshot.busy[0].label, "");
        assert!(snapshot.suggestion.priority.is_some());
        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.vocabulary.tags, vec!["finance"]);
        assert!(snapshot.vocabulary.categories.is_empty());
    }

    #[test]
    fn empty_input_is_an_empty_snapshot() {
        let snapshot = Snapshot::parse("  \n").unwrap();
        assert!(snapshot.task.is_none());
        assert!(snapshot.require_task().is_err());
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = Snapshot::parse("{not json").unwrap_err();
        assert_eq!(err.to_string(), "invalid snapshot JSON");
    }

    #[test]
    fn command_line_now_wins() {
        let snapshot = Snapshot::parse(r#"{"now": "2025-01-13T10:00:00Z"}"#).unwrap();
        let cli = DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z").unwrap();
        let fallback = || DateTime::parse_from_rfc3339("1999-01-01T00:00:00Z").unwrap();
        assert_eq!(snapshot.resolve_now(Some(cli), fallback), cli);
        assert_eq!(
            snapshot.resolve_now(None, fallback).to_rfc3339(),
            "2025-01-13T10:00:00+00:00"
        );
        assert_eq!(
            Snapshot::default().resolve_now(None, fallback).to_rfc3339(),
            "1999-01-01T00:00:00+00:00"
        );
    }
}
