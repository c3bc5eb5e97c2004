use crate::state::SessionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCommand<'a> {
    Exit,
    SwitchMode(SessionMode),
    ChooseModel,
    /// `cd` in shell mode; `None` means the home directory.
    ChangeDir(Option<&'a str>),
    Input(&'a str),
}

/// Classifies one line of operator input. Blank lines yield `None`.
pub fn parse_input(line: &str, mode: SessionMode) -> Option<LoopCommand<'_>> {
    let input = line.trim();
    if input.is_empty() {
        return None;
    }

    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return Some(LoopCommand::Exit);
    }

    let command = match input {
        "!shell" => LoopCommand::SwitchMode(SessionMode::Shell),
        "!agent" => LoopCommand::SwitchMode(SessionMode::Agent),
        "!model" => LoopCommand::ChooseModel,
        _ if mode == SessionMode::Shell && is_cd(input) => {
            let target = input[2..].trim();
            LoopCommand::ChangeDir((!target.is_empty()).then_some(target))
        }
        _ => LoopCommand::Input(input),
    };
    Some(command)
}

fn is_cd(input: &str) -> bool {
    input == "cd" || input.starts_with("cd ") || input.starts_with("cd\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_ignored() {
        assert_eq!(parse_input("   ", SessionMode::Agent), None);
        assert_eq!(parse_input("", SessionMode::Shell), None);
    }

    #[test]
    fn test_exit_is_case_insensitive() {
        for line in ["exit", "QUIT", " Exit "] {
            assert_eq!(parse_input(line, SessionMode::Agent), Some(LoopCommand::Exit));
        }
    }

    #[test]
    fn test_mode_and_model_commands() {
        assert_eq!(
            parse_input("!shell", SessionMode::Agent),
            Some(LoopCommand::SwitchMode(SessionMode::Shell))
        );
        assert_eq!(
            parse_input("!agent", SessionMode::Shell),
            Some(LoopCommand::SwitchMode(SessionMode::Agent))
        );
        assert_eq!(
            parse_input("!model", SessionMode::Shell),
            Some(LoopCommand::ChooseModel)
        );
    }

    #[test]
    fn test_cd_is_only_special_in_shell_mode() {
        assert_eq!(
            parse_input("cd /tmp", SessionMode::Shell),
            Some(LoopCommand::ChangeDir(Some("/tmp")))
        );
        assert_eq!(
            parse_input("cd", SessionMode::Shell),
            Some(LoopCommand::ChangeDir(None))
        );
        assert_eq!(
            parse_input("cd /tmp", SessionMode::Agent),
            Some(LoopCommand::Input("cd /tmp"))
        );
        assert_eq!(
            parse_input("cdrecord -v", SessionMode::Shell),
            Some(LoopCommand::Input("cdrecord -v"))
        );
    }

    #[test]
    fn test_input_is_trimmed() {
        assert_eq!(
            parse_input("  list files \n", SessionMode::Agent),
            Some(LoopCommand::Input("list files"))
        );
    }
}
