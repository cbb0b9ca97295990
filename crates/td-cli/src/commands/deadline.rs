//! Deadline command: reconciled deadline for `task`.

use std::io::Write;

use anyhow::Result;
use td_core::{Lexicon, SuggestionProvider, Timestamp, reconcile_deadline_with};

use super::input::Snapshot;
use super::util::write_json;

pub fn run<W: Write>(
    writer: &mut W,
    snapshot: &Snapshot,
    provider: &dyn SuggestionProvider,
    now: Timestamp,
    lexicon: &Lexicon,
) -> Result<()> {
    let task = snapshot.require_task()?;
    let result = reconcile_deadline_with(task, &snapshot.context, provider, now, lexicon);
    tracing::debug!(title = %task.title, deadline = %result.deadline, "reconciled deadline");
    write_json(writer, &result)
}
