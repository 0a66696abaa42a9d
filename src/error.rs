//! Error types for commit-quest modules using thiserror.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::SessionState;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository at {path}: {source}")]
    OpenRepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to initialize repository: {0}")]
    InitRepository(#[source] git2::Error),

    #[error("Bare repositories are not supported")]
    BareRepository,

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),
}

/// Errors from reading or writing the project configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config {path} is not valid JSON: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[source] serde_json::Error),
}

/// Errors from the message cache file.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read message cache {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write message cache {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Message cache {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the text generation oracle.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation command '{0}' not found in PATH")]
    NotInstalled(String),

    #[error("Failed to spawn generation command: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Generation command exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Inference request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    #[error("Inference API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned malformed output: {0}")]
    MalformedResponse(String),

    #[error("Model returned no completion")]
    EmptyCompletion,

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<GenerationError>),
}

/// A commit type that is not a single lowercase word.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid commit type '{0}': expected a lowercase word such as feat, fix or chore")]
pub struct InvalidCommitType(pub String);

/// Errors surfaced by a commit session to its caller.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Project directory {0} does not exist or is not a directory")]
    InvalidDirectory(PathBuf),

    #[error("No project configuration found in {0}. Run setup first.")]
    ConfigMissing(PathBuf),

    #[error("No git repository found in {0}, and initialization was declined")]
    RepoMissing(PathBuf),

    #[error("No unstaged changes to describe")]
    NoChanges,

    #[error("Commit message generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("The commit message was generated, but committing it failed: {0}")]
    AutoCommit(#[source] GitError),

    #[error("Nothing to accept: the session is {0}, not awaiting review")]
    NotAwaitingReview(SessionState),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SessionError {
    /// HTTP status used when this error ends a request.
    pub fn status_code(&self) -> u16 {
        match self {
            SessionError::InvalidDirectory(_) => 400,
            SessionError::RepoMissing(_) => 404,
            SessionError::ConfigMissing(_)
            | SessionError::NoChanges
            | SessionError::NotAwaitingReview(_) => 409,
            SessionError::Generation(_) => 502,
            SessionError::AutoCommit(_)
            | SessionError::Git(_)
            | SessionError::Config(_) => 500,
        }
    }

    /// Whether the message is safe to show to an HTTP client as-is.
    pub fn is_user_facing(&self) -> bool {
        self.status_code() < 500
            || matches!(self, SessionError::Generation(_) | SessionError::AutoCommit(_))
    }
}
