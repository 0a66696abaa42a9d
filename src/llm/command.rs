//! Local command generation backend.
//!
//! Runs a user-configured program, writes the prompt to its stdin and treats
//! stdout as the completion. The token budget is exported to the child as
//! `COMMIT_QUEST_MAX_TOKENS` and also enforced on the output by keeping at
//! most that many whitespace-separated tokens.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::GenerationError;

use super::{TextGenerator, with_timeout};

/// Environment variable carrying the token budget to the child process.
pub const MAX_TOKENS_ENV_VAR: &str = "COMMIT_QUEST_MAX_TOKENS";

/// Text generator backed by a local program.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Parse a whitespace-separated command line such as `ollama run llama3`.
    ///
    /// Returns `None` for a blank line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check that the program can be found on PATH.
    pub fn check_installed(&self) -> Result<(), GenerationError> {
        which::which(&self.program)
            .map(|_| ())
            .map_err(|_| GenerationError::NotInstalled(self.program.clone()))
    }

    async fn run(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(MAX_TOKENS_ENV_VAR, max_tokens.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(GenerationError::SpawnFailed)?;

        // A child that exits without reading its input is judged by its exit status.
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(prompt.as_bytes()).await
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(GenerationError::SpawnFailed(e));
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(GenerationError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(GenerationError::NonZeroExit { code, stderr });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let completion = truncate_tokens(&stdout, max_tokens);
        if completion.is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }
        Ok(completion)
    }
}

/// Keep at most `max_tokens` whitespace-separated tokens.
///
/// Text within the budget is returned trimmed but otherwise untouched, so
/// line breaks in short completions survive.
fn truncate_tokens(text: &str, max_tokens: u32) -> String {
    let trimmed = text.trim();
    let limit = max_tokens as usize;

    match trimmed.split_whitespace().nth(limit) {
        None => trimmed.to_string(),
        Some(_) => trimmed
            .split_whitespace()
            .take(limit)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[async_trait]
impl TextGenerator for CommandGenerator {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        debug!(program = %self.program, prompt_len = prompt.len(), "Running generation command");
        with_timeout(self.timeout, self.run(prompt, max_tokens)).await
    }
}
