use crate::state::{Segment, StreamControl};
use crate::tools::{ActionDirective, Confirmation};
use anyhow::Result;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Everything the session loop needs from the operator's terminal.
pub trait Frontend {
    /// `None` means the operator asked to leave (EOF or interrupt at the prompt).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    fn confirm(&mut self, question: &str) -> Result<Confirmation>;

    /// Picks one of `models`; `None` keeps the current model.
    fn choose_model(&mut self, models: &[String], current: Option<&str>)
        -> Result<Option<String>>;

    /// Called before a model turn is requested. The returned token is
    /// cancelled when the operator interrupts the turn.
    fn begin_response(&mut self) -> CancellationToken;

    fn render_segment(&mut self, segment: &Segment) -> StreamControl;

    fn end_response(&mut self, cancelled: bool);

    fn preview_action(&mut self, directive: &ActionDirective);

    fn notice(&mut self, text: &str);

    fn error(&mut self, text: &str);

    /// Live destination for command output.
    fn output_sink(&mut self) -> &mut dyn Write;
}
