//! CLI subcommand implementations.

pub mod ai;
pub mod categorize;
pub mod deadline;
pub mod extract;
pub mod input;
pub mod plan;
pub mod priority;
pub mod schedule;
pub mod slot;
pub mod suggest;
pub mod util;
pub mod workload;
