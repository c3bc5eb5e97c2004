pub mod commands;
pub mod frontend;


pub use commands::{parse_input, LoopCommand};
pub use frontend::Frontend;

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::state::conversation::system_prompt;
use crate::state::{ConversationState, SessionMode, StreamOutcome, StreamingResponseParser};
use crate::tools::{extract, ActionDirective, ActionExecutor, ActionResult, Confirmation};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

const AGENT_PROMPT: &str = "(Agent) >>> ";

/// One interactive session: the read / stream / act loop over a frontend.
pub struct Session<F: Frontend> {
    client: ApiClient,
    state: ConversationState,
    executor: ActionExecutor,
    frontend: F,
    seed_input: Option<String>,
}

impl<F: Frontend> Session<F> {
    pub fn new(client: ApiClient, config: &Config, frontend: F) -> Self {
        Self {
            client,
            state: ConversationState::new(system_prompt(config.shell_name())),
            executor: ActionExecutor::new(config.shell.clone()),
            frontend,
            seed_input: None,
        }
    }

    /// Lists installed models and settles on one before the loop starts.
    /// An unreachable server or an empty model list is fatal here.
    pub async fn start(client: ApiClient, config: &Config, frontend: F) -> Result<Self> {
        let mut session = Self::new(client, config, frontend);
        let models = session
            .client
            .list_models()
            .await
            .context("Failed to fetch models")?;
        if models.is_empty() {
            bail!("No models found. Is the model server running?");
        }

        let preselected = config
            .model
            .as_deref()
            .filter(|wanted| models.iter().any(|m| m == wanted));
        let model = match preselected {
            Some(model) => model.to_string(),
            None => {
                if let Some(wanted) = config.model.as_deref() {
                    session
                        .frontend
                        .notice(&format!("Model '{wanted}' is not installed."));
                }
                session
                    .frontend
                    .choose_model(&models, None)?
                    .unwrap_or_else(|| models[0].clone())
            }
        };
        session.client.set_model(model);
        session
            .frontend
            .notice(&format!("Using model: {}", session.client.model()));
        Ok(session)
    }

    /// Text submitted as the first agent input instead of reading a line.
    pub fn with_seed_input(mut self, seed: Option<String>) -> Self {
        self.seed_input = seed.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            if self.state.take_auto_continue() {
                self.run_agent_turn().await?;
                continue;
            }

            let Some(line) = self.next_input()? else {
                break;
            };
            let mode = self.state.mode();
            let Some(command) = parse_input(&line, mode) else {
                continue;
            };

            match command {
                LoopCommand::Exit => break,
                LoopCommand::SwitchMode(mode) => {
                    self.state.set_mode(mode);
                    self.frontend.notice(match mode {
                        SessionMode::Agent => "Switched to Agent Mode.",
                        SessionMode::Shell => "Switched to Shell Mode.",
                    });
                }
                LoopCommand::ChooseModel => self.switch_model().await?,
                LoopCommand::ChangeDir(target) => self.change_dir(target),
                LoopCommand::Input(input) => match mode {
                    SessionMode::Agent => {
                        self.state.push_user_input(input);
                        self.run_agent_turn().await?;
                    }
                    SessionMode::Shell => self.run_shell_command(input),
                },
            }
        }

        self.frontend.notice("Bye!");
        Ok(())
    }

    fn next_input(&mut self) -> Result<Option<String>> {
        if self.state.mode() == SessionMode::Agent {
            if let Some(seed) = self.seed_input.take() {
                self.frontend.notice(&format!("{AGENT_PROMPT}{seed}"));
                return Ok(Some(seed));
            }
        }
        let prompt = match self.state.mode() {
            SessionMode::Agent => AGENT_PROMPT.to_string(),
            SessionMode::Shell => format!("(Shell:{}) $ ", current_dir_display()),
        };
        self.frontend.read_line(&prompt)
    }

    /// Streams one model reply for the current history and acts on it.
    /// Transport failures are shown and leave history untouched.
    async fn run_agent_turn(&mut self) -> Result<()> {
        let outcome = match self.stream_response().await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.frontend.error(&error.to_string());
                return Ok(());
            }
        };

        if outcome.cancelled {
            self.frontend.notice("Response cancelled.");
            if !outcome.text.is_empty() {
                self.state.record_assistant(outcome.text);
            }
            return Ok(());
        }

        let directives = extract(&outcome.text);
        self.state.record_assistant(outcome.text);
        for directive in directives.into_ordered() {
            self.perform(directive)?;
        }
        Ok(())
    }

    async fn stream_response(&mut self) -> Result<StreamOutcome, ApiError> {
        let cancel = self.frontend.begin_response();
        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            stream = self.client.create_stream(self.state.history()) => Some(stream),
        };
        let stream = match stream {
            Some(Ok(stream)) => stream,
            Some(Err(error)) => {
                self.frontend.end_response(false);
                return Err(error);
            }
            None => {
                self.frontend.end_response(true);
                return Ok(StreamOutcome {
                    text: String::new(),
                    cancelled: true,
                });
            }
        };

        let frontend = &mut self.frontend;
        let result = StreamingResponseParser::new()
            .drive(stream, &cancel, |segment| frontend.render_segment(segment))
            .await;
        let cancelled = matches!(&result, Ok(outcome) if outcome.cancelled);
        self.frontend.end_response(cancelled);
        result
    }

    fn perform(&mut self, directive: ActionDirective) -> Result<()> {
        self.frontend.preview_action(&directive);
        let question = match &directive {
            ActionDirective::Execute { .. } => "Execute? (y/n) ".to_string(),
            ActionDirective::Write { filename, .. } => format!("Write to '{filename}'? (y/n) "),
        };
        let confirmation = self.frontend.confirm(&question)?;
        if confirmation == Confirmation::Approved {
            self.frontend.notice("Running...");
        }

        let result = match &directive {
            ActionDirective::Execute { command } => {
                let sink = self.frontend.output_sink();
                self.executor.run_command(command, confirmation, sink)
            }
            ActionDirective::Write { filename, content } => {
                self.executor.write_file(filename, content, confirmation)
            }
        };
        self.report(confirmation, &directive, &result);
        self.state.record_action(confirmation, &result);
        Ok(())
    }

    fn report(
        &mut self,
        confirmation: Confirmation,
        directive: &ActionDirective,
        result: &ActionResult,
    ) {
        match (confirmation, directive) {
            (Confirmation::Denied, _) => self.frontend.notice("Cancelled."),
            _ if !result.succeeded => self.frontend.error(&result.output),
            (_, ActionDirective::Write { .. }) => self.frontend.notice(&result.output),
            (_, ActionDirective::Execute { .. }) => {}
        }
    }

    /// Shell-mode input is confirmed by the act of typing it.
    fn run_shell_command(&mut self, command: &str) {
        let result = self.executor.run_command(
            command,
            Confirmation::Approved,
            self.frontend.output_sink(),
        );
        if !result.succeeded {
            self.frontend.error(&result.output);
        }
        self.state.record_shell_output(command, &result.output);
    }

    fn change_dir(&mut self, target: Option<&str>) {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        let path = match (target, home) {
            (None, Some(home)) => home,
            (None, None) => {
                self.frontend.error("cd: HOME is not set");
                return;
            }
            (Some("~"), Some(home)) => home,
            (Some(target), Some(home)) if target.starts_with("~/") => home.join(&target[2..]),
            (Some(target), _) => PathBuf::from(target),
        };
        if let Err(error) = std::env::set_current_dir(&path) {
            self.frontend
                .error(&format!("cd failed: {}: {error}", path.display()));
        }
    }

    async fn switch_model(&mut self) -> Result<()> {
        self.frontend.notice("Fetching models...");
        let models = match self.client.list_models().await {
            Ok(models) => models,
            Err(error) => {
                self.frontend.error(&error.to_string());
                return Ok(());
            }
        };
        if models.is_empty() {
            self.frontend.error("No models found.");
            return Ok(());
        }

        let current = self.client.model().to_string();
        match self.frontend.choose_model(&models, Some(&current))? {
            Some(model) => {
                self.client.set_model(model);
                self.frontend
                    .notice(&format!("Switched to model: {}", self.client.model()));
            }
            None => self.frontend.notice(&format!("Keeping model: {current}")),
        }
        Ok(())
    }
}

fn current_dir_display() -> String {
    std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
