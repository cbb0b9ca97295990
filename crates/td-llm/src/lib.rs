//! Claude API integration for the task manager.
//!
//! Fetches raw priority, deadline, schedule and category suggestions. The payloads are
//! returned as loosely-typed JSON; deciding what to trust is left to
//! `td-core`, so nothing here validates scores or dates.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use td_core::{ContextItem, Interval, TaskFacts, Timestamp, Vocabulary, extract_json_object};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const SUGGESTION_MAX_TOKENS: u32 = 800;
const SUGGESTION_TEMPERATURE: f32 = 0.2;
/// Busy intervals beyond this many are left out of schedule prompts.
const MAX_BUSY_IN_PROMPT: usize = 20;

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// How often and how patiently failed calls are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub const NONE: Self = Self {
        max_retries: 0,
        initial_delay: Duration::ZERO,
    };

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Claude API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    retry: RetryPolicy,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given API key and the default retry
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Asks for a priority assessment of `task`.
    pub async fn priority_payload(
        &self,
        model: &str,
        task: &TaskFacts,
        context: &[ContextItem],
        now: Timestamp,
        complexity: f64,
    ) -> Result<Value, LlmError> {
        let prompt = build_priority_prompt(task, context, now, complexity);
        self.json_payload(model, &prompt).await
    }

    /// Asks for a deadline for `task`.
    pub async fn deadline_payload(
        &self,
        model: &str,
        task: &TaskFacts,
        context: &[ContextItem],
        now: Timestamp,
    ) -> Result<Value, LlmError> {
        let prompt = build_deadline_prompt(task, context, now);
        self.json_payload(model, &prompt).await
    }

    /// Asks for a time slot for `task` given existing commitments.
    pub async fn schedule_payload(
        &self,
        model: &str,
        task: &TaskFacts,
        busy: &[Interval],
        now: Timestamp,
    ) -> Result<Value, LlmError> {
        let prompt = build_schedule_prompt(task, busy, now);
        self.json_payload(model, &prompt).await
    }

    /// Asks for categories and tags for `task`, preferring names in use.
    pub async fn categorize_payload(
        &self,
        model: &str,
        task: &TaskFacts,
        vocabulary: &Vocabulary,
    ) -> Result<Value, LlmError> {
        let prompt = build_category_prompt(task, vocabulary);
        self.json_payload(model, &prompt).await
    }

    async fn json_payload(&self, model: &str, prompt: &str) -> Result<Value, LlmError> {
        let text = self.complete_with_retry(model, prompt).await?;
        recover_payload(&text)
    }

    async fn complete_with_retry(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let mut retry = 0;
        loop {
            let result = match self.complete(model, prompt).await {
                Ok(text) if text.trim().is_empty() => Err(LlmError::InvalidResponse(
                    "empty text content".to_string(),
                )),
                other => other,
            };
            match result {
                Ok(text) => return Ok(text),
                Err(err) if retry < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry);
                    warn!(error = %err, retry = retry + 1, ?delay, "suggestion request failed, retrying");
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = MessageRequest {
            model: model.to_string(),
            max_tokens: SUGGESTION_MAX_TOKENS,
            temperature: SUGGESTION_TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| LlmError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        let payload: MessageResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
        extract_text(payload.content)
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

fn extract_text(blocks: Vec<ContentBlock>) -> Result<String, LlmError> {
    let pieces: Vec<String> = blocks
        .into_iter()
        .map(|ContentBlock::Text { text }| text)
        .collect();
    if pieces.is_empty() {
        return Err(LlmError::InvalidResponse(
            "missing text content".to_string(),
        ));
    }
    Ok(pieces.join("\n"))
}

fn parse_api_error(body: &str) -> Option<LlmError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| LlmError::Api {
            message: payload.error.message,
        })
}

/// Pulls the JSON object out of model text.
fn recover_payload(text: &str) -> Result<Value, LlmError> {
    extract_json_object(text).ok_or_else(|| {
        debug!(len = text.len(), "no JSON object in model output");
        LlmError::InvalidResponse("no JSON object in model output".to_string())
    })
}

fn push_task_lines(lines: &mut Vec<String>, task: &TaskFacts) {
    lines.push(format!("title: {}", task.title));
    if !task.description.is_empty() {
        lines.push(format!("description: {}", task.description));
    }
    if let Some(category) = &task.category {
        lines.push(format!("category: {category}"));
    }
    lines.push(format!("user_priority: {}", task.user_priority));
    lines.push(format!(
        "estimated_duration_minutes: {}",
        task.estimated_duration_minutes
    ));
    if let Some(deadline) = task.deadline {
        lines.push(format!("user_deadline: {}", deadline.to_rfc3339()));
    }
}

fn push_context_lines(lines: &mut Vec<String>, context: &[ContextItem]) {
    if context.is_empty() {
        lines.push("context: none".to_string());
        return;
    }
    lines.push("context:".to_string());
    for item in context {
        match item.occurred_at {
            Some(at) => lines.push(format!("- [{}] {}", at.to_rfc3339(), item.text)),
            None => lines.push(format!("- {}", item.text)),
        }
    }
}

fn build_priority_prompt(
    task: &TaskFacts,
    context: &[ContextItem],
    now: Timestamp,
    complexity: f64,
) -> String {
    let mut lines = vec![
        "You are a task-management assistant. Score how urgently this task should be done."
            .to_string(),
        "Return strict JSON: {\"priority_score\":0-10,\"priority_label\":\"Critical|High|Medium|Low|Very Low\",\"reasoning\":\"...\",\"urgency_factors\":[\"...\"],\"context_relevance\":0-1}".to_string(),
        "Rules:".to_string(),
        "- The label must match the score: >=9 Critical, >=7 High, >=5 Medium, >=2 Low.".to_string(),
        "- Simple practice, tutorial or hobby tasks are Low unless a deadline says otherwise.".to_string(),
        "- Weigh deadline proximity and urgent context above everything else.".to_string(),
        String::new(),
        format!("now: {}", now.to_rfc3339()),
        format!("complexity_score: {complexity:.1}"),
    ];
    push_task_lines(&mut lines, task);
    push_context_lines(&mut lines, context);
    lines.join("\n")
}

fn build_deadline_prompt(task: &TaskFacts, context: &[ContextItem], now: Timestamp) -> String {
    let mut lines = vec![
        "You are a task-management assistant. Suggest a realistic deadline for this task."
            .to_string(),
        "Return strict JSON: {\"suggested_deadline\":\"ISO 8601\",\"confidence\":0-1,\"reasoning\":\"...\",\"factors_considered\":[\"...\"]}".to_string(),
        "Rules:".to_string(),
        format!(
            "- The deadline MUST be after {}. Never suggest a past date.",
            now.format("%B %d, %Y")
        ),
        "- Leave buffer for unexpected delays; respect dates mentioned in the context."
            .to_string(),
        String::new(),
        format!("now: {}", now.to_rfc3339()),
    ];
    push_task_lines(&mut lines, task);
    push_context_lines(&mut lines, context);
    lines.join("\n")
}

fn build_schedule_prompt(task: &TaskFacts, busy: &[Interval], now: Timestamp) -> String {
    let mut lines = vec![
        "You are a scheduling assistant. Pick a time slot for this task.".to_string(),
        "Return strict JSON: {\"start_time\":\"ISO 8601\",\"end_time\":\"ISO 8601\",\"confidence\":0-1,\"reasoning\":\"...\",\"alternatives\":[{\"start\":\"ISO 8601\",\"end\":\"ISO 8601\"}]}".to_string(),
        "Rules:".to_string(),
        "- Use working hours on weekdays and avoid every busy interval.".to_string(),
        "- Offer at most two alternatives.".to_string(),
        String::new(),
        format!("now: {}", now.to_rfc3339()),
    ];
    push_task_lines(&mut lines, task);
    if busy.is_empty() {
        lines.push("busy: none".to_string());
    } else {
        lines.push("busy:".to_string());
        for interval in busy.iter().take(MAX_BUSY_IN_PROMPT) {
            lines.push(format!(
                "- {}..{} {}",
                interval.start.to_rfc3339(),
                interval.end.to_rfc3339(),
                interval.label
            ));
        }
    }
    lines.join("\n")
}

fn build_category_prompt(task: &TaskFacts, vocabulary: &Vocabulary) -> String {
    let mut lines = vec![
        "You are a task-management assistant. Suggest categories and tags for this task."
            .to_string(),
        "Return strict JSON: {\"suggested_categories\":[\"...\"],\"suggested_tags\":[\"...\"],\"confidence\":0-1,\"reasoning\":\"...\"}".to_string(),
        "Rules:".to_string(),
        "- Prefer existing categories and tags; add new ones only when none fit.".to_string(),
        "- Categories are broad (Work, Personal, Health); tags are specific (meeting, research).".to_string(),
        "- Give 2-3 categories and 3-5 tags.".to_string(),
        String::new(),
    ];
    push_task_lines(&mut lines, task);
    lines.push(format!(
        "existing_categories: {}",
        join_or_none(&vocabulary.categories)
    ));
    lines.push(format!("existing_tags: {}", join_or_none(&vocabulary.tags)));
    lines.join("\n")
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn now() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 13, 10, 0, 0)
            .unwrap()
    }

    fn task() -> TaskFacts {
        let mut task = TaskFacts::new("Quarterly report");
        task.description = "Numbers for the board".to_string();
        task.category = Some("Finance".to_string());
        task
    }

    #[test]
    fn client_rejects_empty_api_key() {
        assert!(matches!(
            Client::new(""),
            Err(LlmError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_rejects_whitespace_api_key() {
        assert!(matches!(
            Client::new("   "),
            Err(LlmError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_debug_redacts_api_key() {
        let client = Client::new("secret-key")
            .unwrap()
            .with_retry(RetryPolicy::NONE);
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("max_retries: 0"));
    }

    #[test]
    fn retry_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(RetryPolicy::NONE.delay_for(3), Duration::ZERO);
    }

    #[test]
    fn priority_prompt_includes_task_and_context() {
        let context = [
            ContextItem::new("board meeting moved to Thursday"),
            ContextItem {
                text: "numbers due".to_string(),
                occurred_at: Some(now()),
            },
        ];
        let prompt = build_priority_prompt(&task(), &context, now(), 3.2);
        assert!(prompt.contains("title: Quarterly report"));
        assert!(prompt.contains("category: Finance"));
        assert!(prompt.contains("user_priority: medium"));
        assert!(prompt.contains("complexity_score: 3.2"));
        assert!(prompt.contains("- board meeting moved to Thursday"));
        assert!(prompt.contains("- [2025-01-13T10:00:00+00:00] numbers due"));
    }

    #[test]
    fn deadline_prompt_forbids_past_dates() {
        let prompt = build_deadline_prompt(&task(), &[], now());
        assert!(prompt.contains("MUST be after January 13, 2025"));
        assert!(prompt.contains("context: none"));
    }

    #[test]
    fn schedule_prompt_lists_busy_intervals() {
        let busy = [Interval::new(now(), now() + chrono::Duration::hours(1), "standup")];
        let prompt = build_schedule_prompt(&task(), &busy, now());
        assert!(prompt.contains("- 2025-01-13T10:00:00+00:00..2025-01-13T11:00:00+00:00 standup"));
        assert!(build_schedule_prompt(&task(), &[], now()).contains("busy: none"));
    }

    #[test]
    fn category_prompt_lists_existing_names() {
        let vocabulary = Vocabulary {
            categories: vec!["Work".to_string(), "Finance".to_string()],
            tags: Vec::new(),
        };
        let prompt = build_category_prompt(&task(), &vocabulary);
        assert!(prompt.contains("title: Quarterly report"));
        assert!(prompt.contains("existing_categories: Work, Finance"));
        assert!(prompt.contains("existing_tags: none"));
        assert!(prompt.contains("2-3 categories and 3-5 tags"));
    }

    #[test]
    fn recover_payload_accepts_fenced_json() {
        let value = recover_payload("Sure!\n```json\n{\"priority_score\": 7}\n```").unwrap();
        assert_eq!(value["priority_score"], 7);
    }

    #[test]
    fn recover_payload_rejects_prose() {
        let err = recover_payload("I cannot help with that.").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn parse_api_error_reads_message() {
        let err = parse_api_error(r#"{"error":{"type":"overloaded_error","message":"Overloaded"}}"#)
            .unwrap();
        assert_eq!(err.to_string(), "API error: Overloaded");
    }

    #[test]
    fn extract_text_joins_blocks() {
        let blocks = vec![
            ContentBlock::Text {
                text: "a".to_string(),
            },
            ContentBlock::Text {
                text: "b".to_string(),
            },
        ];
        assert_eq!(extract_text(blocks).unwrap(), "a\nb");
        assert!(extract_text(Vec::new()).is_err());
    }
}
