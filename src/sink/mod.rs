use std::{fs::File, io::Write, path::PathBuf};

use anyhow::Context;

use crate::{console::Console, record::Record};

pub mod prompt;

pub use prompt::{FixedPath, SavePrompt, TerminalDialog};

/// How a call to [`save`] ended.
#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    NoData,
    Canceled,
    Written(PathBuf),
}

/// Ask for a destination and write `records` there as CSV.
///
/// Nothing is asked or written when there are no records, and nothing is written when the
/// prompt comes back empty.
pub fn save<W: Write>(
    records: &[Record],
    prompt: &mut dyn SavePrompt,
    console: &mut Console<W>,
) -> anyhow::Result<SaveOutcome> {
    if records.is_empty() {
        console.no_data()?;
        return Ok(SaveOutcome::NoData);
    }

    let Some(path) = prompt.prompt_for_save_path()? else {
        console.canceled()?;
        return Ok(SaveOutcome::Canceled);
    };

    let file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(records, file).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = records.len(), "wrote results");

    console.saved(&path)?;
    Ok(SaveOutcome::Written(path))
}

/// Header row from the [`Record`] field names, then one row per record. Absent fields are
/// left empty.
pub fn write_csv<W: Write>(records: &[Record], out: W) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
