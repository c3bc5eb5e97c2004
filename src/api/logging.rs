use serde_json::Value;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

const DEFAULT_LOG_PATH: &str = "/tmp/termai-debug.log";
const DEBUG_ENV: &str = "TERMAI_DEBUG_PAYLOAD";
const LOG_PATH_ENV: &str = "TERMAI_LOG_PATH";

/// Debug log sink, resolved from the environment on each event.
///
/// Events go to `TERMAI_LOG_PATH`, or to a fixed file under `/tmp` while
/// stderr is a terminal so they do not interleave with the conversation.
/// Anything that cannot be appended to a file is printed on stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DebugLog {
    file: Option<PathBuf>,
}

impl DebugLog {
    fn from_env() -> Option<Self> {
        debug_log_enabled().then(|| Self {
            file: log_file_from_env(),
        })
    }

    fn event(&self, header: &str, body: &str) {
        let entry = format!("[termai] {header}\n{body}\n");

        let appended = self.file.as_ref().is_some_and(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(entry.as_bytes()))
                .is_ok()
        });
        if !appended {
            eprint!("{entry}");
        }
    }
}

pub fn debug_log_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn log_file_from_env() -> Option<PathBuf> {
    match std::env::var(LOG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path.trim())),
        _ => std::io::stderr()
            .is_terminal()
            .then(|| PathBuf::from(DEFAULT_LOG_PATH)),
    }
}

/// Outgoing `/api/chat` body, pretty printed.
pub fn log_chat_request(url: &str, request: &Value) {
    let Some(log) = DebugLog::from_env() else {
        return;
    };
    let body = serde_json::to_string_pretty(request)
        .unwrap_or_else(|_| "<unserializable request>".to_string());
    log.event(&format!("chat_request url={url}"), &body);
}

/// A stream record that was skipped instead of ending the stream.
pub fn log_dropped_record(line: &[u8], reason: &dyn Display) {
    if let Some(log) = DebugLog::from_env() {
        log.event(
            &format!("record_dropped reason={reason}"),
            &String::from_utf8_lossy(line),
        );
    }
}

pub fn log_action(kind: &str, detail: &str, status: &str) {
    if let Some(log) = DebugLog::from_env() {
        log.event(&format!("action kind={kind} status={status}"), detail);
    }
}
