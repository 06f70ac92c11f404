use std::{
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
};

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Handle on the progress bar currently drawn, if any, shared with other writers to the
/// terminal so they can hide it while they print.
#[derive(Clone, Default)]
pub struct ActiveBar(Arc<Mutex<Option<ProgressBar>>>);

impl ActiveBar {
    fn set(&self, bar: Option<ProgressBar>) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = bar;
        }
    }

    fn get(&self) -> Option<ProgressBar> {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }

    /// Run `f` with the bar hidden; runs it directly when no bar is drawn.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.get() {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

/// Status lines for the person running the tool.
///
/// Lines go to `out`; the fetch progress bar (when shown) draws on stderr and is suspended
/// while a line is written so the two never interleave.
pub struct Console<W: Write> {
    out: W,
    color: bool,
    show_bar: bool,
    bar: Option<ProgressBar>,
    active: ActiveBar,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool, show_bar: bool) -> Self {
        Console {
            out,
            color,
            show_bar,
            bar: None,
            active: ActiveBar::default(),
        }
    }

    /// The bar this console draws during a fetch, for log output to suspend around.
    pub fn active_bar(&self) -> ActiveBar {
        self.active.clone()
    }

    /// Print `text` without a newline and flush, ready for the answer to be typed.
    pub fn prompt(&mut self, text: &str) -> std::io::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn begin_fetch(&mut self, total: usize) {
        if !self.show_bar {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("=> "));
        }
        self.active.set(Some(bar.clone()));
        self.bar = Some(bar);
    }

    pub fn advance(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn processing(&mut self, id: &str) -> std::io::Result<()> {
        if let Some(bar) = &self.bar {
            bar.set_message(id.to_string());
        }
        self.line(&format!("📑 Processing PubMed ID: {id}"))
    }

    pub fn skipped(&mut self, id: &str) -> std::io::Result<()> {
        let msg = format!("⚠️ No details extracted for PubMed ID {id}.");
        let msg = self.paint(&msg, |s| s.yellow().to_string());
        self.line(&msg)
    }

    /// Close the progress bar and print the tally of kept and skipped records.
    pub fn finish_fetch(&mut self, kept: usize, skipped: usize) -> std::io::Result<()> {
        if let Some(bar) = self.bar.take() {
            self.active.set(None);
            bar.finish_and_clear();
        }
        let ok = self.paint(&format!("✓ {kept}"), |s| s.green().to_string());
        let bad = self.paint(&format!("✗ {skipped}"), |s| s.red().to_string());
        self.line(&format!("{ok} {bad}"))
    }

    pub fn no_data(&mut self) -> std::io::Result<()> {
        self.line("No data extracted.")
    }

    pub fn canceled(&mut self) -> std::io::Result<()> {
        let msg = self.paint("Save operation canceled.", |s| s.yellow().to_string());
        self.line(&msg)
    }

    pub fn saved(&mut self, path: &Path) -> std::io::Result<()> {
        let msg = format!("✅ Data successfully saved to: {}", path.display());
        let msg = self.paint(&msg, |s| s.green().bold().to_string());
        self.line(&msg)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.color {
            style(text)
        } else {
            text.to_string()
        }
    }

    fn line(&mut self, text: &str) -> std::io::Result<()> {
        let Self { out, bar, .. } = self;
        match bar {
            Some(bar) => bar.suspend(|| writeln!(out, "{text}")),
            None => writeln!(out, "{text}"),
        }
    }
}
