use crate::app::Frontend;
use crate::state::{Segment, StreamControl};
use crate::tools::{ActionDirective, Confirmation};
use crate::ui::{LineEditor, LineRead, ResponseRenderer};
use anyhow::Result;
use crossterm::style::Stylize;
use std::io::{self, Stdout, Write};
use std::process::{Command, Stdio};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Interactive frontend on the controlling terminal.
pub struct TerminalFrontend {
    editor: LineEditor,
    renderer: ResponseRenderer<Stdout>,
    interrupt_watch: Option<JoinHandle<()>>,
}

impl TerminalFrontend {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: LineEditor::new()?,
            renderer: ResponseRenderer::new(io::stdout()),
            interrupt_watch: None,
        })
    }

    fn stop_interrupt_watch(&mut self) {
        if let Some(handle) = self.interrupt_watch.take() {
            handle.abort();
        }
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        self.stop_interrupt_watch();
    }
}

impl Frontend for TerminalFrontend {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        println!();
        match self.editor.read(prompt, true)? {
            LineRead::Line(line) => Ok(Some(line)),
            LineRead::Interrupted | LineRead::Eof => Ok(None),
        }
    }

    fn confirm(&mut self, question: &str) -> Result<Confirmation> {
        match self.editor.read(question, false)? {
            LineRead::Line(answer) => Ok(Confirmation::from_answer(&answer)),
            LineRead::Interrupted | LineRead::Eof => Ok(Confirmation::Denied),
        }
    }

    fn choose_model(
        &mut self,
        models: &[String],
        current: Option<&str>,
    ) -> Result<Option<String>> {
        println!("Available models:");
        for (idx, model) in models.iter().enumerate() {
            let marker = if Some(model.as_str()) == current {
                " (current)"
            } else {
                ""
            };
            println!("{}. {model}{marker}", idx + 1);
        }

        let answer = match self.editor.read("Select model (number): ", false)? {
            LineRead::Line(answer) => answer,
            LineRead::Interrupted | LineRead::Eof => return Ok(None),
        };
        match parse_model_choice(&answer, models.len()) {
            Some(idx) => Ok(Some(models[idx].clone())),
            None => {
                println!("Invalid selection.");
                Ok(None)
            }
        }
    }

    fn begin_response(&mut self) -> CancellationToken {
        let _ = self.renderer.begin();

        self.stop_interrupt_watch();
        let token = CancellationToken::new();
        let watched = token.clone();
        self.interrupt_watch = Some(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watched.cancel();
            }
        }));
        token
    }

    fn render_segment(&mut self, segment: &Segment) -> StreamControl {
        match self.renderer.segment(segment) {
            Ok(()) => StreamControl::Continue,
            Err(_) => StreamControl::Cancel,
        }
    }

    fn end_response(&mut self, cancelled: bool) {
        self.stop_interrupt_watch();
        let _ = self.renderer.end(cancelled);
    }

    fn preview_action(&mut self, directive: &ActionDirective) {
        let _ = self.renderer.preview(directive);
    }

    fn notice(&mut self, text: &str) {
        println!("{text}");
    }

    fn error(&mut self, text: &str) {
        eprintln!("{} {text}", "[Error]".red().bold());
    }

    fn output_sink(&mut self) -> &mut dyn Write {
        self.renderer.get_mut()
    }
}

/// 1-based menu answer to an index.
fn parse_model_choice(answer: &str, count: usize) -> Option<usize> {
    let choice: usize = answer.trim().parse().ok()?;
    (1..=count).contains(&choice).then(|| choice - 1)
}

/// Text currently selected in the kitty terminal, if kitty remote control
/// is reachable and something is selected.
pub fn read_kitty_selection() -> Option<String> {
    let output = Command::new("kitty")
        .args(["@", "get-text", "--selection", "primary"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
