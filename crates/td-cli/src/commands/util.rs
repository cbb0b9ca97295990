//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use td_core::{Timestamp, parse_timestamp};

/// The caller's clock. Only the CLI reads it; the core is always handed `now`.
pub fn local_now() -> Timestamp {
    Local::now().fixed_offset()
}

/// Parse a timestamp argument.
///
/// Supports:
/// - RFC 3339: "2026-01-15T10:30:00Z"
/// - Local wall time: "2026-01-15 10:30" or "2026-01-15"
pub fn parse_timestamp_arg(s: &str) -> Result<Timestamp, String> {
    parse_timestamp(s, *local_now().offset()).ok_or_else(|| {
        format!("invalid time: {s}. Use RFC 3339 (e.g., 2026-01-15T10:30:00Z) or YYYY-MM-DD HH:MM")
    })
}

/// Writes `value` as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    writeln!(writer, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}
