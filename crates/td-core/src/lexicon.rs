//! Keyword lists used by the urgency, complexity and override rules.
//!
//! The lists are hand-tuned data rather than structure, so they live in one
//! serde-friendly struct that callers may override from configuration.
//! Every field falls back to the built-in list when omitted.

use serde::{Deserialize, Serialize};

const URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediately",
    "today",
    "tomorrow",
    "deadline",
    "due",
    "meeting",
    "schedule",
    "important",
    "priority",
    "critical",
    "approaching",
    "soon",
    "fast",
    "quick",
    "promptly",
];

const COMPLEXITY_TERMS: &[&str] = &[
    "complex",
    "challenging",
    "difficult",
    "intricate",
    "sophisticated",
    "advanced",
    "complicated",
    "elaborate",
    "high-level",
    "comprehensive",
    "extensive",
    "involved",
    "detailed",
    "critical",
    "crucial",
    "essential",
    "vital",
    "significant",
    "major",
    "important",
    "key",
    "central",
    "fundamental",
    "pivotal",
    "primary",
    "strategic",
    "technical",
    "review",
    "analysis",
    "design",
    "implementation",
    "migration",
    "integration",
    "deployment",
    "optimization",
    "reconfiguration",
    "restructuring",
    "revamp",
    "overhaul",
    "refactor",
    "system",
    "framework",
    "architecture",
    "infrastructure",
    "platform",
    "meeting",
    "presentation",
    "urgent",
    "immediate",
    "stakeholder",
];

const SIMPLICITY_TERMS: &[&str] = &[
    "simple",
    "basic",
    "easy",
    "straightforward",
    "quick",
    "small",
    "minor",
    "trivial",
    "beginner",
    "starter",
    "practice",
    "exercise",
    "tutorial",
    "learning",
    "demo",
    "example",
    "sample",
    "test",
    "prototype",
    "hobby",
    "game",
    "html",
    "css",
    "frontend",
    "ui",
    "simple app",
    "tic-tac-toe",
    "tic tac toe",
    "tictactoe",
    "toy project",
    "practice project",
];

const STRONG_SIMPLICITY_PHRASES: &[&str] = &[
    "simple game",
    "basic game",
    "simple html",
    "basic html",
    "simple app",
    "basic app",
    "learning project",
    "practice project",
    "simple tic-tac-toe",
    "basic tic-tac-toe",
    "simple tictactoe",
    "html game",
    "css game",
    "beginner project",
    "starter project",
];

const FORCE_LOW_PHRASES: &[&str] = &[
    "tic-tac-toe",
    "tic tac toe",
    "tictactoe",
    "simple html",
    "basic html",
    "html game",
    "learning project",
    "practice project",
    "simple game",
    "tutorial project",
    "beginner project",
];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Keyword lists and weights.
///
/// All matching is case-insensitive substring matching against lower-cased
/// text, so entries should be lower-case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Words that mark a piece of context as urgent.
    pub urgency_keywords: Vec<String>,
    /// Words that raise the complexity heuristic.
    pub complexity_terms: Vec<String>,
    /// Words that lower the complexity heuristic.
    pub simplicity_terms: Vec<String>,
    /// Phrases that cap complexity at [`Lexicon::strong_simplicity_cap`].
    pub strong_simplicity_phrases: Vec<String>,
    /// Phrases that force the final priority to Low.
    pub force_low_phrases: Vec<String>,
    /// Points added per complexity hit.
    pub complexity_weight: f64,
    /// Points removed per simplicity hit.
    pub simplicity_weight: f64,
    /// Complexity ceiling when a strong-simplicity phrase matches.
    pub strong_simplicity_cap: f64,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            urgency_keywords: owned(URGENCY_KEYWORDS),
            complexity_terms: owned(COMPLEXITY_TERMS),
            simplicity_terms: owned(SIMPLICITY_TERMS),
            strong_simplicity_phrases: owned(STRONG_SIMPLICITY_PHRASES),
            force_low_phrases: owned(FORCE_LOW_PHRASES),
            complexity_weight: 0.8,
            simplicity_weight: 1.5,
            strong_simplicity_cap: 1.5,
        }
    }
}

impl Lexicon {
    /// Number of entries in `terms` occurring in `lowered`.
    pub fn count_hits(terms: &[String], lowered: &str) -> usize {
        terms
            .iter()
            .filter(|term| !term.is_empty() && lowered.contains(term.as_str()))
            .count()
    }

    /// First entry in `terms` occurring in `lowered`.
    pub fn first_hit<'a>(terms: &'a [String], lowered: &str) -> Option<&'a str> {
        terms
            .iter()
            .find(|term| !term.is_empty() && lowered.contains(term.as_str()))
            .map(String::as_str)
    }
}
