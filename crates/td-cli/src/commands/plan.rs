//! Plan command: relevant context, priority, deadline and placement for
//! `task` in one document.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use td_core::{
    ContextItem, DeadlineResult, PriorityResult, RelevanceConfig, ScheduleSuggestion,
    ScoredContext, SuggestionProvider, TaskFacts, Timestamp, reconcile_deadline_with,
    reconcile_priority_with, select_relevant, suggest_schedule_with,
};

use super::input::Snapshot;
use super::util::write_json;
use crate::Config;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Plan {
    relevant_context: Vec<ScoredContext>,
    priority: PriorityResult,
    deadline: DeadlineResult,
    schedule: ScheduleSuggestion,
}

/// The context items `plan` reasons about, best match first.
pub fn relevant_context(
    task: &TaskFacts,
    snapshot: &Snapshot,
    now: Timestamp,
    config: &RelevanceConfig,
) -> Vec<ScoredContext> {
    select_relevant(task, &snapshot.context, now, config)
}

pub fn run<W: Write>(
    writer: &mut W,
    snapshot: &Snapshot,
    provider: &dyn SuggestionProvider,
    config: &Config,
    now: Timestamp,
) -> Result<()> {
    let task = snapshot.require_task()?;
    let slots = config.slot_config()?;

    let relevant = relevant_context(task, snapshot, now, &config.context);
    tracing::debug!(
        title = %task.title,
        kept = relevant.len(),
        of = snapshot.context.len(),
        "selected relevant context"
    );
    let context: Vec<ContextItem> = relevant.iter().map(|scored| scored.item.clone()).collect();

    let priority = reconcile_priority_with(task, &context, provider, now, &config.lexicon);
    let deadline = reconcile_deadline_with(task, &context, provider, now, &config.lexicon);

    // An undated task is scheduled against the deadline just reconciled.
    let mut planned = task.clone();
    if planned.deadline.is_none() {
        planned.deadline = Some(deadline.deadline);
    }
    let schedule = suggest_schedule_with(&planned, &snapshot.busy, provider, &slots, now)
        .with_context(|| format!("cannot schedule {:?}", task.title))?;

    write_json(
        writer,
        &Plan {
            relevant_context: relevant,
            priority,
            deadline,
            schedule,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    fn run_on(json: &str, config: &Config) -> Result<Value> {
        let snapshot = Snapshot::parse(json)?;
        let mut output = Vec::new();
        run(&mut output, &snapshot, &snapshot.suggestion, config, snapshot.now.unwrap())?;
        Ok(serde_json::from_slice(&output)?)
    }

    const SNAPSHOT: &str = r#"{
        "now": "2025-01-13T10:00:00+02:00",
        "task": {"title": "Prepare budget review"},
        "context": [
            {"text": "The budget review meeting is tomorrow at 2pm"},
            {"text": "Lunch order for Friday"}
        ]
    }"#;

    #[test]
    fn plans_from_relevant_context_only() {
        let plan = run_on(SNAPSHOT, &Config::default()).unwrap();

        let relevant = plan["relevantContext"].as_array().unwrap();
        assert_eq!(relevant.len(), 1);
        assert_eq!(
            relevant[0]["text"],
            "The budget review meeting is tomorrow at 2pm"
        );

        assert_eq!(plan["priority"]["label"], "High");
        assert_eq!(plan["deadline"]["deadline"], "2025-01-14T14:00:00+02:00");
        // The reconciled deadline pulls a medium task forward to today.
        assert_eq!(plan["schedule"]["start"], "2025-01-13T10:00:00+02:00");
    }

    #[test]
    fn bad_working_hours_fail_before_output() {
        let mut config = Config::default();
        config.working_hours.start = "18:00".to_string();
        let err = run_on(SNAPSHOT, &config).unwrap_err();
        assert!(format!("{err:#}").contains("working hours start (18:00:00) must be before end (17:00:00)"));
    }
}
