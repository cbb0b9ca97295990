//! Categorize command: categories and tags for `task`.

use std::io::Write;

use anyhow::Result;
use td_core::{SuggestionProvider, suggest_categories_with};

use super::input::Snapshot;
use super::util::write_json;

pub fn run<W: Write>(
    writer: &mut W,
    snapshot: &Snapshot,
    provider: &dyn SuggestionProvider,
) -> Result<()> {
    let task = snapshot.require_task()?;
    let result = suggest_categories_with(task, &snapshot.vocabulary, provider);
    tracing::debug!(
        title = %task.title,
        categories = result.categories.len(),
        tags = result.tags.len(),
        "suggested categories"
    );
    write_json(writer, &result)
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn run_on(json: &str) -> String {
        let snapshot = Snapshot::parse(json).unwrap();
        let mut output = Vec::new();
        run(&mut output, &snapshot, &snapshot.suggestion).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn model_text_is_anchored_to_vocabulary() {
        let output = run_on(
            r#"{"task": {"title": "Dentist appointment"},
                "vocabulary": {"categories": ["Health", "Work"], "tags": ["appointment"]},
                "suggestion": {"category": "Sure! {\"suggested_categories\": [\"health\", \"Errands\"], \"suggested_tags\": [\"Appointment\", \"Dentist\"], \"confidence\": 0.85}"}}"#,
        );
        assert_snapshot!(output, @r#"
        {
          "categories": [
            "Health",
            "Errands"
          ],
          "tags": [
            "appointment",
            "dentist"
          ],
          "confidence": 0.85,
          "reasoning": "Suggested from the task's title and description."
        }
        "#);
    }

    #[test]
    fn without_suggestion_matches_task_text() {
        let output = run_on(
            r#"{"task": {"title": "Prepare the weekly meeting", "category": "Work"},
                "vocabulary": {"categories": ["work"], "tags": ["meeting", "travel"]}}"#,
        );
        assert_snapshot!(output, @r#"
        {
          "categories": [
            "work"
          ],
          "tags": [
            "meeting"
          ],
          "confidence": 0.3,
          "reasoning": "No usable suggestion; matched existing names found in the task."
        }
        "#);
    }

    #[test]
    fn missing_task_is_an_error() {
        let snapshot = Snapshot::parse("{}").unwrap();
        let err = run(&mut Vec::new(), &snapshot, &snapshot.suggestion).unwrap_err();
        assert_eq!(err.to_string(), "snapshot has no \"task\"");
    }
}
