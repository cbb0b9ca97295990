//! Workload command: load summary over `tasks`.

use std::io::Write;

use anyhow::Result;
use td_core::{Timestamp, assess_workload};

use super::input::Snapshot;
use super::util::write_json;

pub fn run<W: Write>(writer: &mut W, snapshot: &Snapshot, now: Timestamp) -> Result<()> {
    let summary = assess_workload(&snapshot.tasks, now);
    tracing::debug!(level = %summary.level, total = summary.total, "assessed workload");
    write_json(writer, &summary)
}
