//! Runtime settings read from the environment.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::llm::Provider;

pub const PROVIDER_ENV_VAR: &str = "COMMIT_QUEST_PROVIDER";
pub const INFERENCE_URL_ENV_VAR: &str = "COMMIT_QUEST_INFERENCE_URL";
pub const MODEL_ENV_VAR: &str = "COMMIT_QUEST_MODEL";
pub const TOKEN_ENV_VAR: &str = "HF_TOKEN";
pub const COMMAND_ENV_VAR: &str = "COMMIT_QUEST_COMMAND";
pub const TIMEOUT_ENV_VAR: &str = "COMMIT_QUEST_GENERATION_TIMEOUT";
pub const RETRIES_ENV_VAR: &str = "COMMIT_QUEST_RETRIES";

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL: &str = "distilgpt2";
pub const DEFAULT_COMMAND: &str = "ollama run llama3";
const DEFAULT_ATTEMPTS: u32 = 1;

/// Name of the fallback project directory under the system temp dir.
const TEMP_PROJECT_DIR_NAME: &str = "CommitMessageProject";

/// Generation backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub provider: Provider,
    pub inference_url: String,
    pub model: String,
    pub api_token: Option<String>,
    pub command: String,
    /// `None` means wait for the model indefinitely.
    pub generation_timeout: Option<Duration>,
    /// Total generation attempts per proposal (1 disables retrying).
    pub generation_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_token: None,
            command: DEFAULT_COMMAND.to_string(),
            generation_timeout: None,
            generation_attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Read settings from `COMMIT_QUEST_*` variables, falling back to defaults.
    ///
    /// Invalid values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let defaults = Settings::default();

        let provider = match non_empty_var(PROVIDER_ENV_VAR) {
            Some(value) => value.parse().unwrap_or_else(|e| {
                warn!("Invalid {PROVIDER_ENV_VAR}: {e}, using {}", defaults.provider);
                defaults.provider
            }),
            None => defaults.provider,
        };

        let generation_timeout = non_empty_var(TIMEOUT_ENV_VAR).and_then(|v| {
            match v.parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    warn!("Invalid {TIMEOUT_ENV_VAR} value '{v}', generation will not time out");
                    None
                }
            }
        });

        let generation_attempts = match non_empty_var(RETRIES_ENV_VAR) {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(
                        "Invalid {RETRIES_ENV_VAR} value '{v}', using default {DEFAULT_ATTEMPTS}"
                    );
                    DEFAULT_ATTEMPTS
                }
            },
            None => DEFAULT_ATTEMPTS,
        };

        Self {
            provider,
            inference_url: non_empty_var(INFERENCE_URL_ENV_VAR).unwrap_or(defaults.inference_url),
            model: non_empty_var(MODEL_ENV_VAR).unwrap_or(defaults.model),
            api_token: non_empty_var(TOKEN_ENV_VAR),
            command: non_empty_var(COMMAND_ENV_VAR).unwrap_or(defaults.command),
            generation_timeout,
            generation_attempts,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Persistent fallback project directory, created on demand.
pub fn default_project_dir() -> Result<PathBuf, ConfigError> {
    let dir = env::temp_dir().join(TEMP_PROJECT_DIR_NAME);
    fs::create_dir_all(&dir).map_err(|source| ConfigError::WriteFailed {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
