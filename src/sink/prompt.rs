use std::path::{Path, PathBuf};

use dialoguer::{Input, theme::ColorfulTheme};

/// Extension given to destinations typed without one.
pub const DEFAULT_EXTENSION: &str = "csv";

/// Something that can be asked where the results should be saved.
///
/// `Ok(None)` means the user backed out; nothing should be written in that case.
pub trait SavePrompt {
    fn prompt_for_save_path(&mut self) -> anyhow::Result<Option<PathBuf>>;
}

/// A destination decided up front, e.g. from `--output`.
pub struct FixedPath {
    path: Option<PathBuf>,
}

impl FixedPath {
    pub fn new(path: PathBuf) -> Self {
        FixedPath { path: Some(path) }
    }
}

impl SavePrompt for FixedPath {
    fn prompt_for_save_path(&mut self) -> anyhow::Result<Option<PathBuf>> {
        Ok(self.path.take())
    }
}

/// Ask on the terminal, prefilled with a dated file name. Clearing the answer cancels.
pub struct TerminalDialog {
    suggestion: String,
}

impl Default for TerminalDialog {
    fn default() -> Self {
        TerminalDialog {
            suggestion: format!(
                "pubmed_{}.{DEFAULT_EXTENSION}",
                chrono::Local::now().format("%Y-%m-%d")
            ),
        }
    }
}

impl SavePrompt for TerminalDialog {
    fn prompt_for_save_path(&mut self) -> anyhow::Result<Option<PathBuf>> {
        let answer: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Save CSV File (leave empty to cancel)")
            .with_initial_text(self.suggestion.as_str())
            .allow_empty(true)
            .interact_text()?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        Ok(Some(with_default_extension(Path::new(answer))))
    }
}

/// Append `.csv` to a path that has no extension of its own.
pub fn with_default_extension(path: &Path) -> PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().is_none() {
        path.set_extension(DEFAULT_EXTENSION);
    }
    path
}
