use std::io::{BufRead, Write};

use anyhow::Context;

use crate::{
    console::Console,
    eutils::Literature,
    extract::extract,
    record::Record,
    sink::{self, SaveOutcome, SavePrompt},
};

pub const DEFAULT_COUNT: u32 = 5;

/// What was already decided on the command line; anything missing is asked for.
#[derive(Debug, Default, Clone)]
pub struct Request {
    pub query: Option<String>,
    pub count: Option<u32>,
}

/// Search, fetch every hit, keep the records with a title and hand them to the sink.
pub fn run<R: BufRead, W: Write>(
    request: Request,
    input: &mut R,
    console: &mut Console<W>,
    source: &dyn Literature,
    prompt: &mut dyn SavePrompt,
) -> anyhow::Result<SaveOutcome> {
    let query = match request.query {
        Some(q) => q,
        None => {
            console.prompt("🔍 Enter your PubMed search query: ")?;
            read_answer(input)?.context("no search query given")?
        }
    };
    let count = match request.count {
        Some(n) => n,
        None => {
            console.prompt("📄 Enter number of papers to fetch (default is 5): ")?;
            parse_count(read_answer(input)?.as_deref().unwrap_or_default())
        }
    };

    let records = collect(source, &query, count, console)?;
    sink::save(&records, prompt, console)
}

/// Records for up to `count` hits of `query`, in search order, minus those without a title.
pub fn collect<W: Write>(
    source: &dyn Literature,
    query: &str,
    count: u32,
    console: &mut Console<W>,
) -> anyhow::Result<Vec<Record>> {
    let ids = source.search(query, count)?;

    console.begin_fetch(ids.len());
    let mut records = Vec::with_capacity(ids.len());
    let mut skipped = 0;
    for id in &ids {
        console.processing(id)?;
        let markup = source.fetch(id)?;
        let record = extract(&markup, id);
        if record.is_exportable() {
            records.push(record);
        } else {
            skipped += 1;
            console.skipped(id)?;
        }
        console.advance();
    }
    console.finish_fetch(records.len(), skipped)?;

    Ok(records)
}

/// Blank answers fall back to [`DEFAULT_COUNT`], and so does anything that is not a count.
pub fn parse_count(answer: &str) -> u32 {
    let answer = answer.trim();
    if answer.is_empty() {
        return DEFAULT_COUNT;
    }
    answer.parse().unwrap_or_else(|_| {
        tracing::warn!(answer, "not a number of papers, using {DEFAULT_COUNT}");
        DEFAULT_COUNT
    })
}

/// One line without its line ending; `None` at end of input.
fn read_answer<R: BufRead>(input: &mut R) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line).context("failed to read from stdin")? == 0 {
        return Ok(None);
    }
    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(Some(trimmed.to_string()))
}
