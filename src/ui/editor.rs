use anyhow::{Context, Result};
use rustyline::completion::FilenameCompleter;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};
use rustyline::{Completer, Helper, Highlighter, Hinter, Validator};

#[derive(Helper, Completer, Hinter, Highlighter, Validator)]
pub struct PathHelper {
    #[rustyline(Completer)]
    completer: FilenameCompleter,
}

impl PathHelper {
    pub fn new() -> Self {
        Self {
            completer: FilenameCompleter::new(),
        }
    }
}

impl Default for PathHelper {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    Interrupted,
    Eof,
}

/// Line editor with filename completion and in-memory history.
pub struct LineEditor {
    inner: Editor<PathHelper, DefaultHistory>,
}

impl LineEditor {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(false)
            .build();
        let mut inner: Editor<PathHelper, DefaultHistory> =
            Editor::with_config(config).context("Unable to create line editor")?;
        inner.set_helper(Some(PathHelper::new()));
        Ok(Self { inner })
    }

    /// Reads one line. Only lines read with `remember` set are kept for
    /// history navigation, so confirmation answers stay out of it.
    pub fn read(&mut self, prompt: &str, remember: bool) -> Result<LineRead> {
        match self.inner.readline(prompt) {
            Ok(line) => {
                if remember && !line.trim().is_empty() {
                    let _ = self.inner.add_history_entry(line.trim());
                }
                Ok(LineRead::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(LineRead::Interrupted),
            Err(ReadlineError::Eof) => Ok(LineRead::Eof),
            Err(error) => Err(error).context("Failed to read input"),
        }
    }
}
