//! Core reconciliation and scheduling logic for the task manager.
//!
//! This crate contains the fundamental types and logic for:
//! - Temporal extraction: pulling dates out of free-form context text
//! - Priority and deadline reconciliation: correcting optional external
//!   suggestions against deterministic rules
//! - Scheduling: finding conflict-free slots for one or many tasks
//! - Categorization: categories and tags anchored to the names in use
//!
//! Every operation is a pure function of its inputs. The caller supplies
//! `now`; nothing here reads a clock or touches I/O.

mod batch;
mod calendar;
mod category;
mod deadline;
pub mod lexicon;
mod priority;
pub mod relevance;
pub mod slot;
pub mod suggestion;
pub mod temporal;
pub mod types;
pub mod urgency;
pub mod workload;

pub use batch::schedule_tasks;
pub use calendar::parse_timestamp;
pub use category::{suggest_categories, suggest_categories_with};
pub use deadline::{reconcile_deadline, reconcile_deadline_with};
pub use lexicon::Lexicon;
pub use priority::{complexity_score, reconcile_priority, reconcile_priority_with};
pub use relevance::{RelevanceConfig, ScoredContext, select_relevant};
pub use slot::{
    ScheduleError, SlotConfig, SlotOutcome, earliest_start_for, find_slot, suggest_schedule,
    suggest_schedule_with,
};
pub use suggestion::{
    CategorySuggestion, DeadlineSuggestion, NoSuggestions, PrioritySuggestion, ScheduleHint,
    StaticSuggestions, SuggestionProvider, extract_json_object,
};
pub use temporal::{extract_dates, extract_explicit, extract_from_text};
pub use types::{
    CategoryResult, Confidence, ContextItem, DateKind, DeadlineResult, ExtractedDate, Interval,
    Placement, PriorityLabel, PriorityResult, ScheduleSuggestion, ScheduledTask, TaskFacts,
    Timestamp, UserPriority, ValidationError, Vocabulary,
};
pub use urgency::{has_urgent_keyword, is_item_urgent, is_urgent};
pub use workload::{WorkloadLevel, WorkloadSummary, assess_workload};
