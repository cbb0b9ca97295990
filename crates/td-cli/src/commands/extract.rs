//! Extract command: dates found in the snapshot's context.

use std::io::Write;

use anyhow::Result;
use td_core::{Lexicon, Timestamp, extract_dates};

use super::input::Snapshot;
use super::util::write_json;

pub fn run<W: Write>(
    writer: &mut W,
    snapshot: &Snapshot,
    now: Timestamp,
    lexicon: &Lexicon,
) -> Result<()> {
    let dates = extract_dates(&snapshot.context, now, lexicon);
    tracing::debug!(items = snapshot.context.len(), dates = dates.len(), "extracted dates");
    write_json(writer, &dates)
}
