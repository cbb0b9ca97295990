//! Context selection by keyword overlap with a task.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::{ContextItem, TaskFacts, Timestamp};

const PHRASE_BONUS: f64 = 0.3;
const MIN_KEYWORD_LEN: usize = 4;

const STOP_WORDS: &[&str] = &[
    "will", "with", "this", "that", "have", "from", "they", "know", "want", "been", "good",
    "much", "some", "time", "very", "when", "come", "here", "just", "like", "long", "make",
    "many", "over", "such", "take", "than", "them", "well", "were",
];

/// Limits for [`select_relevant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    /// Dated items older than this are skipped. Undated items are kept.
    pub days_back: u32,
    pub max_entries: usize,
    /// Items must score strictly above this.
    pub min_relevance: f64,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            days_back: 7,
            max_entries: 10,
            min_relevance: 0.1,
        }
    }
}

/// A context item with its relevance to a task, in \[0, 1\].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredContext {
    #[serde(flatten)]
    pub item: ContextItem,
    pub relevance: f64,
}

/// Distinct lower-case keywords from the task's title, description and
/// category, in order of first appearance.
pub fn task_keywords(task: &TaskFacts) -> Vec<String> {
    let fields = [
        task.title.as_str(),
        task.description.as_str(),
        task.category.as_deref().unwrap_or_default(),
    ];
    let mut keywords: Vec<String> = Vec::new();
    for word in fields.iter().flat_map(|field| field.split_whitespace()) {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.chars().count() >= MIN_KEYWORD_LEN
            && !STOP_WORDS.contains(&word.as_str())
            && !keywords.contains(&word)
        {
            keywords.push(word);
        }
    }
    keywords
}

/// Fraction of `keywords` found in `text`, plus a bonus when they occur as
/// one phrase. Capped at 1.
pub fn relevance_score(text: &str, keywords: &[String]) -> f64 {
    if keywords.is_empty() || text.is_empty() {
        return 0.0;
    }
    let lowered = text.to_lowercase();
    let matches = keywords
        .iter()
        .filter(|keyword| lowered.contains(keyword.as_str()))
        .count();
    let ratio = f64::from(u32::try_from(matches).unwrap_or(u32::MAX))
        / f64::from(u32::try_from(keywords.len()).unwrap_or(u32::MAX));
    let bonus = if lowered.contains(&keywords.join(" ")) {
        PHRASE_BONUS
    } else {
        0.0
    };
    (ratio + bonus).min(1.0)
}

/// Picks the context items most related to `task`, best first.
///
/// Ties keep their input order.
pub fn select_relevant(
    task: &TaskFacts,
    items: &[ContextItem],
    now: Timestamp,
    config: &RelevanceConfig,
) -> Vec<ScoredContext> {
    let cutoff = now - Duration::days(i64::from(config.days_back));
    let keywords = task_keywords(task);
    let mut scored: Vec<ScoredContext> = items
        .iter()
        .filter(|item| item.occurred_at.is_none_or(|at| at >= cutoff))
        .map(|item| ScoredContext {
            item: item.clone(),
            relevance: relevance_score(&item.text, &keywords),
        })
        .filter(|scored| scored.relevance > config.min_relevance)
        .collect();
    scored.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    scored.truncate(config.max_entries);
    scored
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
        let mut task = TaskFacts::new("Quarterly budget review");
        task.description = "Finish the budget, with the finance team.".to_string();
        task.category = Some("Finance".to_string());
        task
    }

    #[test]
    fn keywords_are_distinct_long_and_not_stop_words() {
        assert_eq!(
            task_keywords(&task()),
            vec!["quarterly", "budget", "review", "finish", "finance", "team"]
        );
    }

    #[test]
    fn score_is_fraction_with_phrase_bonus() {
        let keywords: Vec<String> = ["budget", "review"].map(String::from).to_vec();
        assert!((relevance_score("Budget meeting", &keywords) - 0.5).abs() < 1e-9);
        assert!((relevance_score("the budget review is due", &keywords) - 1.0).abs() < 1e-9);
        assert!(relevance_score("lunch", &keywords).abs() < f64::EPSILON);
        assert!(relevance_score("budget", &[]).abs() < f64::EPSILON);
    }

    #[test]
    fn selects_recent_relevant_items_best_first() {
        let old = ContextItem {
            text: "budget review finance quarterly".to_string(),
            occurred_at: Some(now() - Duration::days(30)),
        };
        let items = vec![
            ContextItem::new("finance team offsite"),
            old,
            ContextItem::new("weather is nice"),
            ContextItem::new("quarterly budget review notes from finance team"),
        ];
        let selected = select_relevant(&task(), &items, now(), &RelevanceConfig::default());
        let texts: Vec<&str> = selected.iter().map(|s| s.item.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "quarterly budget review notes from finance team",
                "finance team offsite",
            ]
        );
    }

    #[test]
    fn truncates_to_max_entries() {
        let items: Vec<ContextItem> = (0..5)
            .map(|i| ContextItem::new(format!("budget note {i}")))
            .collect();
        let config = RelevanceConfig {
            max_entries: 2,
            ..RelevanceConfig::default()
        };
        let selected = select_relevant(&task(), &items, now(), &config);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].item.text, "budget note 0");
    }
}
