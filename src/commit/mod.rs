//! Diff summarization, prompt building, message generation, caching and scoring.

pub mod cache;
pub mod diff;
pub mod message;
pub mod prompt;
pub mod score;

pub use cache::{CACHE_FILE_NAME, MessageCache};
pub use diff::{Change, ChangeTag, DiffSummary, GENERAL_UPDATES, summarize};
pub use message::{CommitMessage, CommitType, GenerationRequest, MessageSource, generate};
pub use prompt::{MessageLength, compose};
pub use score::{ScoreResult, boost_for, score};
