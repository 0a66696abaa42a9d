//! commit-quest - commit message suggestions for your working tree.
//!
//! # Overview
//!
//! commit-quest summarizes unstaged git changes into keywords and
//! frontend/backend tags, turns the summary into a prompt for a text
//! generation model, and proposes commit messages. Each quest also awards
//! experience points based on the size of the change and the project's
//! specialization. It runs as a CLI or as a local HTTP endpoint.

pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use commit::{
    Change, ChangeTag, CommitMessage, CommitType, DiffSummary, MessageCache, MessageLength,
    MessageSource, ScoreResult,
};
pub use config::{ConfigStore, ProjectConfig, Settings};
pub use error::{CacheError, ConfigError, GenerationError, GitError, SessionError};
pub use llm::{Provider, TextGenerator};
pub use session::{Proposal, ProposalRequest, Session, SessionOptions, SessionState};
