//! Category and tag suggestions anchored to the names already in use.
//!
//! A suggested name that matches an existing category or tag, ignoring case,
//! takes the existing spelling and is listed before any new name. Without a
//! usable suggestion, existing names whose words all appear in the task text
//! are proposed instead.

use std::collections::HashSet;

use tracing::debug;

use crate::suggestion::{CategorySuggestion, SuggestionProvider};
use crate::types::{CategoryResult, Confidence, TaskFacts, Vocabulary};

const MAX_CATEGORIES: usize = 3;
const MAX_TAGS: usize = 5;
/// Confidence assumed for a suggestion that states none.
const SUGGESTED_CONFIDENCE: f32 = 0.5;
const MATCHED_CONFIDENCE: f32 = 0.3;

const SUGGESTED_REASONING: &str = "Suggested from the task's title and description.";
const MATCHED_REASONING: &str = "No usable suggestion; matched existing names found in the task.";
const NO_MATCH_REASONING: &str = "No usable suggestion and no existing name matches the task.";

/// Suggests categories and tags using whatever the provider offers.
pub fn suggest_categories_with(
    task: &TaskFacts,
    vocabulary: &Vocabulary,
    provider: &dyn SuggestionProvider,
) -> CategoryResult {
    let suggestion = provider.category_suggestion(task);
    suggest_categories(task, vocabulary, suggestion.as_ref())
}

/// Suggests up to three categories and five tags for `task`.
pub fn suggest_categories(
    task: &TaskFacts,
    vocabulary: &Vocabulary,
    suggestion: Option<&CategorySuggestion>,
) -> CategoryResult {
    if let Some(suggestion) = suggestion {
        let categories = anchor(
            &suggestion.categories,
            &vocabulary.categories,
            MAX_CATEGORIES,
            false,
        );
        let tags = anchor(&suggestion.tags, &vocabulary.tags, MAX_TAGS, true);
        if !categories.is_empty() || !tags.is_empty() {
            return CategoryResult {
                categories,
                tags,
                confidence: suggestion
                    .confidence
                    .unwrap_or(Confidence::clamped(SUGGESTED_CONFIDENCE)),
                reasoning: suggestion
                    .reasoning
                    .clone()
                    .unwrap_or_else(|| SUGGESTED_REASONING.to_string()),
            };
        }
        debug!(title = %task.title, "category suggestion named nothing usable");
    }
    from_task_text(task, vocabulary)
}

/// Existing names mentioned by the task, plus the task's own category.
fn from_task_text(task: &TaskFacts, vocabulary: &Vocabulary) -> CategoryResult {
    let mut text = format!("{} {}", task.title, task.description);
    if let Some(category) = &task.category {
        text.push(' ');
        text.push_str(category);
    }
    let seen: HashSet<String> = words(&text).collect();
    let mentioned = |name: &&String| {
        let mut parts = words(name).peekable();
        parts.peek().is_some() && parts.all(|part| seen.contains(&part))
    };

    let mut named: Vec<String> = task.category.iter().cloned().collect();
    named.extend(vocabulary.categories.iter().filter(mentioned).cloned());
    let categories = anchor(&named, &vocabulary.categories, MAX_CATEGORIES, false);
    let named: Vec<String> = vocabulary.tags.iter().filter(mentioned).cloned().collect();
    let tags = anchor(&named, &vocabulary.tags, MAX_TAGS, true);

    let (confidence, reasoning) = if categories.is_empty() && tags.is_empty() {
        (Confidence::MIN, NO_MATCH_REASONING)
    } else {
        (Confidence::clamped(MATCHED_CONFIDENCE), MATCHED_REASONING)
    };
    CategoryResult {
        categories,
        tags,
        confidence,
        reasoning: reasoning.to_string(),
    }
}

/// Trims and dedupes `names` ignoring case, swaps in the existing spelling
/// where one exists, moves those names to the front and keeps `limit`.
fn anchor(names: &[String], existing: &[String], limit: usize, lowercase_new: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut known = Vec::new();
    let mut fresh = Vec::new();
    for name in names {
        let name = name.trim();
        let key = name.to_lowercase();
        if name.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        match existing
            .iter()
            .map(|e| e.trim())
            .find(|e| e.to_lowercase() == key)
        {
            Some(existing) => known.push(existing.to_string()),
            None if lowercase_new => fresh.push(key),
            None => fresh.push(name.to_string()),
        }
    }
    known.extend(fresh);
    known.truncate(limit);
    known
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::suggestion::StaticSuggestions;

    fn vocabulary() -> Vocabulary {
        Vocabulary {
            categories: ["Work", "Personal", "Deep Work"].map(String::from).to_vec(),
            tags: ["meeting", "Research", "urgent"].map(String::from).to_vec(),
        }
    }

    fn suggestion(value: serde_json::Value) -> CategorySuggestion {
        CategorySuggestion::from_value(&value)
    }

    #[test]
    fn existing_names_come_first_with_their_spelling() {
        let task = TaskFacts::new("Sync with design");
        let result = suggest_categories(
            &task,
            &vocabulary(),
            Some(&suggestion(json!({
                "categories": ["Design", "work"],
                "tags": ["Sync", "MEETING", "meeting", "research"],
                "confidence": 0.9,
                "reasoning": "A design sync."
            }))),
        );
        assert_eq!(result.categories, vec!["Work", "Design"]);
        assert_eq!(result.tags, vec!["meeting", "Research", "sync"]);
        assert_eq!(result.confidence, Confidence::clamped(0.9));
        assert_eq!(result.reasoning, "A design sync.");
    }

    #[test]
    fn caps_categories_and_tags() {
        let task = TaskFacts::new("Everything at once");
        let result = suggest_categories(
            &task,
            &Vocabulary::default(),
            Some(&suggestion(json!({
                "categories": ["a", "b", "c", "d"],
                "tags": ["t1", "t2", "t3", "t4", "t5", "t6", "t7"]
            }))),
        );
        assert_eq!(result.categories, vec!["a", "b", "c"]);
        assert_eq!(result.tags.len(), 5);
        assert_eq!(result.confidence, Confidence::clamped(0.5));
        assert_eq!(result.reasoning, SUGGESTED_REASONING);
    }

    #[test]
    fn empty_suggestion_falls_back_to_task_text() {
        let mut task = TaskFacts::new("Deep work block for the research meeting");
        task.category = Some("Planning".to_string());
        let provider = StaticSuggestions {
            category: Some(json!({"categories": [], "tags": ["  "]})),
            ..StaticSuggestions::default()
        };
        let result = suggest_categories_with(&task, &vocabulary(), &provider);
        assert_eq!(result.categories, vec!["Work", "Deep Work", "Planning"]);
        assert_eq!(result.tags, vec!["meeting", "Research"]);
        assert_eq!(result.confidence, Confidence::clamped(0.3));
        assert_eq!(result.reasoning, MATCHED_REASONING);
    }

    #[test]
    fn nothing_to_go_on_is_empty_with_zero_confidence() {
        let task = TaskFacts::new("Water the plants");
        let result = suggest_categories(&task, &vocabulary(), None);
        assert!(result.categories.is_empty());
        assert!(result.tags.is_empty());
        assert_eq!(result.confidence, Confidence::MIN);
        assert_eq!(result.reasoning, NO_MATCH_REASONING);
    }
}
