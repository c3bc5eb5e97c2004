pub const FENCE: &str = "```";
pub const EXECUTE_FENCE: &str = "```execute";
pub const WRITE_FENCE: &str = "```write:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionDirective {
    Execute { command: String },
    Write { filename: String, content: String },
}

/// At most one directive of each kind; the first fence of a kind wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub execute: Option<ActionDirective>,
    pub write: Option<ActionDirective>,
    write_first: bool,
}

impl Directives {
    pub fn is_empty(&self) -> bool {
        self.execute.is_none() && self.write.is_none()
    }

    /// Directives in the order their fences appear in the response.
    pub fn into_ordered(self) -> Vec<ActionDirective> {
        let (first, second) = if self.write_first {
            (self.write, self.execute)
        } else {
            (self.execute, self.write)
        };
        first.into_iter().chain(second).collect()
    }
}

/// Finds the action directives in a complete response. Only call this once
/// the stream has ended; a half-received fence must never be acted on.
pub fn extract(text: &str) -> Directives {
    let execute = extract_execute(text);
    let write = extract_write(text);
    let write_first = match (&execute, &write) {
        (Some((execute_at, _)), Some((write_at, _))) => write_at < execute_at,
        _ => false,
    };
    Directives {
        execute: execute.map(|(_, directive)| directive),
        write: write.map(|(_, directive)| directive),
        write_first,
    }
}

/// Offset of the first `label` fence whose label ends at whitespace or at
/// the end of the text, so "```executed" is not an execute fence.
fn find_labeled_fence(text: &str, label: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(found) = text[from..].find(label) {
        let at = from + found;
        let after = &text[at + label.len()..];
        if after.chars().next().is_none_or(char::is_whitespace) {
            return Some(at);
        }
        from = at + label.len();
    }
    None
}

fn extract_execute(text: &str) -> Option<(usize, ActionDirective)> {
    let fence_at = find_labeled_fence(text, EXECUTE_FENCE)?;
    let body_start = fence_at + EXECUTE_FENCE.len();
    let body_end = body_start + text[body_start..].find(FENCE)?;
    let command = text[body_start..body_end].trim();
    if command.is_empty() {
        return None;
    }
    Some((
        fence_at,
        ActionDirective::Execute {
            command: command.to_string(),
        },
    ))
}

fn extract_write(text: &str) -> Option<(usize, ActionDirective)> {
    let fence_at = text.find(WRITE_FENCE)?;
    let name_start = fence_at + WRITE_FENCE.len();
    let name_len = text[name_start..]
        .find(char::is_whitespace)
        .unwrap_or(text.len() - name_start);
    let filename = &text[name_start..name_start + name_len];
    if filename.is_empty() || filename.contains(FENCE) {
        return None;
    }

    let body_start = name_start + name_len;
    let body_end = body_start + text[body_start..].find(FENCE)?;
    let content = strip_one_trailing_newline(strip_one_leading_newline(
        &text[body_start..body_end],
    ));

    Some((
        fence_at,
        ActionDirective::Write {
            filename: filename.to_string(),
            content: content.to_string(),
        },
    ))
}

fn strip_one_leading_newline(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}

fn strip_one_trailing_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}
