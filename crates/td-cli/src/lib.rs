//! Task manager CLI library.
//!
//! This crate provides the `td` command-line interface over the core
//! reconciliation and scheduling logic.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, WorkingHours};
