//! Fetching suggestions from Claude before the core runs.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use td_core::{
    ContextItem, Interval, Lexicon, StaticSuggestions, TaskFacts, Timestamp, Vocabulary,
    complexity_score,
};
use td_llm::{Client, LlmError};
use tokio::runtime::Runtime;
use tracing::warn;

use super::input::Snapshot;
use crate::Config;

/// A suggestion payload a command consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Need {
    Priority,
    Deadline,
    Schedule,
    Categorize,
}

/// Blocking wrapper around the async client.
///
/// Any API failure is logged and reported as "no suggestion"; only a
/// missing key or a broken runtime is an error.
pub struct Advisor {
    client: Client,
    model: String,
    runtime: Runtime,
}

impl Advisor {
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| anyhow!("missing Claude API key (set TD_API_KEY or config.toml)"))?;
        let client = Client::new(api_key).context("failed to create LLM client")?;
        let runtime = Runtime::new().context("failed to initialize tokio runtime")?;
        Ok(Self {
            client,
            model: config.model.clone(),
            runtime,
        })
    }

    /// Fetches each needed payload for the snapshot's task in turn. A failed
    /// call leaves its slot empty.
    pub fn fetch(
        &self,
        needs: &[Need],
        snapshot: &Snapshot,
        context: &[ContextItem],
        now: Timestamp,
        lexicon: &Lexicon,
    ) -> Result<StaticSuggestions> {
        let task = snapshot.require_task()?;
        let mut suggestions = StaticSuggestions::default();
        for need in needs {
            match need {
                Need::Priority => {
                    let complexity = complexity_score(task, lexicon);
                    suggestions.priority = self.priority(task, context, now, complexity);
                }
                Need::Deadline => suggestions.deadline = self.deadline(task, context, now),
                Need::Schedule => suggestions.schedule = self.schedule(task, &snapshot.busy, now),
                Need::Categorize => {
                    suggestions.category = self.categorize(task, &snapshot.vocabulary);
                }
            }
        }
        Ok(suggestions)
    }

    pub fn priority(
        &self,
        task: &TaskFacts,
        context: &[ContextItem],
        now: Timestamp,
        complexity: f64,
    ) -> Option<Value> {
        let result = self.runtime.block_on(self.client.priority_payload(
            &self.model,
            task,
            context,
            now,
            complexity,
        ));
        absent_on_error("priority", result)
    }

    pub fn deadline(
        &self,
        task: &TaskFacts,
        context: &[ContextItem],
        now: Timestamp,
    ) -> Option<Value> {
        let result = self
            .runtime
            .block_on(self.client.deadline_payload(&self.model, task, context, now));
        absent_on_error("deadline", result)
    }

    pub fn schedule(&self, task: &TaskFacts, busy: &[Interval], now: Timestamp) -> Option<Value> {
        let result = self
            .runtime
            .block_on(self.client.schedule_payload(&self.model, task, busy, now));
        absent_on_error("schedule", result)
    }

    pub fn categorize(&self, task: &TaskFacts, vocabulary: &Vocabulary) -> Option<Value> {
        let result = self
            .runtime
            .block_on(self.client.categorize_payload(&self.model, task, vocabulary));
        absent_on_error("category", result)
    }
}

fn absent_on_error(kind: &str, result: Result<Value, LlmError>) -> Option<Value> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(kind, error = %err, "suggestion unavailable, continuing without it");
            None
        }
    }
}
