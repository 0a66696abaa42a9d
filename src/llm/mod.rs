//! Text generation oracle and provider selection.

pub mod command;
pub mod inference;
pub mod retry;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Settings;
use crate::error::GenerationError;

pub use command::CommandGenerator;
pub use inference::InferenceClient;
pub use retry::retry_with_backoff;

/// A black-box text completion model.
///
/// Implementations are stateless per call: nothing carries over from one
/// completion to the next.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`, producing at most roughly `max_tokens` tokens.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError>;
}

/// Supported generation backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    /// Hosted text-generation inference API.
    #[default]
    Inference,
    /// Local program reading the prompt on stdin.
    Command,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Inference => "inference",
            Provider::Command => "command",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inference" | "huggingface" | "hf" => Ok(Provider::Inference),
            "command" | "local" => Ok(Provider::Command),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

/// Build the configured text generator.
pub fn build_generator(settings: &Settings) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    match settings.provider {
        Provider::Inference => {
            let client = InferenceClient::new(
                &settings.inference_url,
                &settings.model,
                settings.api_token.clone(),
            )
            .with_timeout(settings.generation_timeout);
            Ok(Arc::new(client))
        }
        Provider::Command => {
            let generator = CommandGenerator::from_command_line(&settings.command)
                .ok_or_else(|| GenerationError::NotInstalled(settings.command.clone()))?
                .with_timeout(settings.generation_timeout);
            generator.check_installed()?;
            Ok(Arc::new(generator))
        }
    }
}

/// Await `fut`, failing with [`GenerationError::Timeout`] if a limit is set and exceeded.
pub(crate) async fn with_timeout<T, F>(
    limit: Option<Duration>,
    fut: F,
) -> Result<T, GenerationError>
where
    F: Future<Output = Result<T, GenerationError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| GenerationError::Timeout(limit))?,
        None => fut.await,
    }
}
