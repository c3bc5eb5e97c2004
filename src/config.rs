use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::util::{normalize_base_url, parse_bool_flag};

const DEFAULT_API_URL: &str = "http://localhost:11434";
const DEFAULT_SHELL: &str = "/bin/sh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    /// Preselected model; when absent or not installed the operator picks one.
    pub model: Option<String>,
    /// Interpreter used as `<shell> -c <command>`.
    pub shell: String,
    pub seed_from_selection: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url = std::env::var("TERMAI_API_URL")
            .ok()
            .or_else(|| std::env::var("OLLAMA_HOST").ok())
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_base_url(&v))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let model = std::env::var("TERMAI_MODEL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let shell = std::env::var("SHELL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHELL.to_string());
        let seed_from_selection = std::env::var("TERMAI_SEED_SELECTION")
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(false);

        Ok(Self {
            api_url,
            model,
            shell,
            seed_from_selection,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid TERMAI_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if self.shell.trim().is_empty() {
            bail!("No shell interpreter configured; set SHELL");
        }

        if let Some(model) = &self.model {
            if model.chars().any(char::is_whitespace) {
                bail!("Invalid model name: '{model}'. Model names contain no whitespace");
            }
        }

        Ok(())
    }

    /// Short interpreter name for the system prompt, e.g. `fish`.
    pub fn shell_name(&self) -> &str {
        Path::new(&self.shell)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.shell)
    }
}
