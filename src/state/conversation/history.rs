/// Prefix of the user turn that carries an action result back to the model.
pub const ACTION_RESULT_PREFIX: &str = "System Output: ";

/// Builds the system turn. The model is told which interpreter runs its
/// commands, how to mark reasoning, and the two fence kinds it may emit.
pub fn system_prompt(shell_name: &str) -> String {
    format!(
        "You are a Linux terminal assistant. Commands you propose run in {shell_name}.\n\
         [IMPORTANT RULES]\n\
         1. Before answering, write your thinking process enclosed in <think> and </think> tags.\n\
         2. To perform a system action, put exactly one command in a code block labeled \
         'execute'. It runs only after the user confirms it.\n\
         3. To create or overwrite a file, put its full contents in a code block labeled \
         'write:<filename>'.\n\
         4. After an action runs you will receive its output as a message starting with \
         \"{ACTION_RESULT_PREFIX}\". Use it to decide the next step.\n\
         Example:\n\
         <think>User wants to update npm.</think>\n\
         ```execute\n\
         npm update -g\n\
         ```\n"
    )
}

pub fn format_action_result(output: &str) -> String {
    format!("{ACTION_RESULT_PREFIX}{output}")
}

pub fn format_shell_output(command: &str, output: &str) -> String {
    format!("Executed Shell Command: {command}\nOutput:\n{output}")
}
