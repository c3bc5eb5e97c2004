use super::history::{format_action_result, format_shell_output};
use crate::tools::{ActionResult, Confirmation};
use crate::types::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Agent,
    Shell,
}

/// History, mode and the auto-continue flag for one session.
///
/// History is append-only and always starts with the system turn.
/// Auto-continue is raised after an action the operator approved and is
/// consumed by the next loop iteration, which then resubmits history
/// instead of reading input.
#[derive(Debug, Clone)]
pub struct ConversationState {
    history: Vec<Turn>,
    mode: SessionMode,
    auto_continue: bool,
}

impl ConversationState {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            history: vec![Turn::system(system_prompt)],
            mode: SessionMode::Agent,
            auto_continue: false,
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Mode switches leave history and auto-continue alone.
    pub fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
    }

    pub fn auto_continue(&self) -> bool {
        self.auto_continue
    }

    /// Returns the flag and clears it, whatever its value was.
    pub fn take_auto_continue(&mut self) -> bool {
        std::mem::take(&mut self.auto_continue)
    }

    pub fn push_user_input(&mut self, input: impl Into<String>) {
        self.history.push(Turn::user(input));
    }

    pub fn record_assistant(&mut self, raw_response: impl Into<String>) {
        self.history.push(Turn::assistant(raw_response));
    }

    /// Folds an action outcome into history. Only an approved action
    /// triggers auto-continue; its success does not matter.
    pub fn record_action(&mut self, confirmation: Confirmation, result: &ActionResult) {
        match confirmation {
            Confirmation::Approved => {
                self.history
                    .push(Turn::user(format_action_result(&result.output)));
                self.auto_continue = true;
            }
            Confirmation::Denied => {
                self.history.push(Turn::user(result.output.clone()));
            }
        }
    }

    pub fn record_shell_output(&mut self, command: &str, output: &str) {
        self.history
            .push(Turn::user(format_shell_output(command, output)));
    }
}
