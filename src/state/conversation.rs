mod history;
mod state;


pub use history::{format_action_result, format_shell_output, system_prompt};
pub use state::{ConversationState, SessionMode};
