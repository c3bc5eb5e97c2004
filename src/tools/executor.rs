use crate::api::logging::log_action;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use thiserror::Error;

pub const COMMAND_CANCELLED: &str = "User cancelled the command execution.";
pub const WRITE_CANCELLED: &str = "User cancelled the file write.";

const READ_CHUNK: usize = 4096;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action was not confirmed")]
    NotConfirmed,
    #[error("failed to start `{shell} -c {command}`: {source}")]
    Spawn {
        shell: String,
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read command output: {0}")]
    Capture(#[source] io::Error),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Approved,
    Denied,
}

impl Confirmation {
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Self::Approved,
            _ => Self::Denied,
        }
    }
}

/// Outcome of one directive. On failure `output` holds the error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub succeeded: bool,
    pub output: String,
}

impl ActionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
        }
    }

    pub fn cancelled(notice: &str) -> Self {
        Self::failure(notice)
    }
}

/// Runs confirmed directives. Output of spawned commands is streamed live to
/// a sink and also returned so it can be folded into the conversation.
pub struct ActionExecutor {
    shell: String,
}

impl ActionExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn run_command(
        &self,
        command: &str,
        confirmation: Confirmation,
        sink: &mut dyn Write,
    ) -> ActionResult {
        match self.try_run_command(command, confirmation, sink) {
            Ok(output) => ActionResult::success(output),
            Err(ActionError::NotConfirmed) => ActionResult::cancelled(COMMAND_CANCELLED),
            Err(error) => {
                log_action("execute", command, &error.to_string());
                ActionResult::failure(format!("Error: {error}"))
            }
        }
    }

    pub fn write_file(
        &self,
        path: &str,
        content: &str,
        confirmation: Confirmation,
    ) -> ActionResult {
        match try_write_file(Path::new(path), content, confirmation) {
            Ok(()) => {
                log_action("write", path, "ok");
                ActionResult::success(format!(
                    "File '{path}' written successfully ({} bytes).",
                    content.len()
                ))
            }
            Err(ActionError::NotConfirmed) => ActionResult::cancelled(WRITE_CANCELLED),
            Err(error) => {
                log_action("write", path, &error.to_string());
                ActionResult::failure(format!("Error: {error}"))
            }
        }
    }

    fn try_run_command(
        &self,
        command: &str,
        confirmation: Confirmation,
        sink: &mut dyn Write,
    ) -> Result<String, ActionError> {
        if confirmation != Confirmation::Approved {
            return Err(ActionError::NotConfirmed);
        }

        let (mut reader, mut child) = self.spawn_with_merged_output(command)?;

        let mut captured = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = child.wait();
                    return Err(ActionError::Capture(e));
                }
            };
            let chunk = &buf[..read];
            // Sink errors are ignored; the pipe is always drained to EOF.
            let _ = sink.write_all(chunk).and_then(|()| sink.flush());
            captured.extend_from_slice(chunk);
        }
        drop(reader);

        let status = child.wait().map_err(ActionError::Capture)?;
        log_action("execute", command, &status.to_string());

        Ok(String::from_utf8_lossy(&captured).into_owned())
    }

    /// Spawns `<shell> -c <command>` with stdout and stderr sharing one pipe.
    /// The builder owns the parent's copies of the write end and is dropped
    /// before returning, so the reader sees EOF once the child exits.
    fn spawn_with_merged_output(
        &self,
        command: &str,
    ) -> Result<(io::PipeReader, Child), ActionError> {
        let spawn_error = |source: io::Error| ActionError::Spawn {
            shell: self.shell.clone(),
            command: command.to_string(),
            source,
        };

        let (reader, writer) = io::pipe().map_err(spawn_error)?;
        let stderr_writer = writer.try_clone().map_err(spawn_error)?;

        let child = {
            let mut builder = Command::new(&self.shell);
            builder
                .arg("-c")
                .arg(command)
                .stdin(std::process::Stdio::null())
                .stdout(writer)
                .stderr(stderr_writer);
            builder.spawn().map_err(spawn_error)?
        };

        Ok((reader, child))
    }
}

fn try_write_file(
    path: &Path,
    content: &str,
    confirmation: Confirmation,
) -> Result<(), ActionError> {
    if confirmation != Confirmation::Approved {
        return Err(ActionError::NotConfirmed);
    }
    let io_error = |source: io::Error| ActionError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(content.as_bytes()).map_err(io_error)?;
    file.flush().map_err(io_error)
}
