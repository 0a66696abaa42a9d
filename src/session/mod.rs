//! One commit quest: config, repository, proposals and the final decision.
//!
//! ```text
//! NoConfig -> Configured -> RepoReady -> AwaitingReview -> Committed | Declined
//! ```
//!
//! A session never keeps a git handle across an `.await`; the repository is
//! reopened by path for each step that touches it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::Oid;
use tracing::{debug, warn};

use crate::commit::{
    CACHE_FILE_NAME, Change, CommitMessage, CommitType, DiffSummary, GenerationRequest,
    MessageCache, MessageLength, MessageSource, ScoreResult, generate, score,
};
use crate::config::{CONFIG_FILE_NAME, ConfigStore, ProjectConfig, Settings};
use crate::error::{GenerationError, SessionError};
use crate::git::Workspace;
use crate::llm::{TextGenerator, retry_with_backoff};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoConfig,
    Configured,
    RepoReady,
    AwaitingReview,
    Committed,
    Declined,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::NoConfig => "no config",
            SessionState::Configured => "configured",
            SessionState::RepoReady => "repository ready",
            SessionState::AwaitingReview => "awaiting review",
            SessionState::Committed => "committed",
            SessionState::Declined => "declined",
        };
        f.write_str(name)
    }
}

/// Knobs that come from runtime settings rather than the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Generation attempts per message; 1 means no retry.
    pub generation_attempts: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            generation_attempts: 1,
        }
    }
}

impl From<&Settings> for SessionOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            generation_attempts: settings.generation_attempts,
        }
    }
}

/// How the repository was made available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    Existing,
    Initialized,
}

/// What the caller wants proposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRequest {
    pub commit_type: CommitType,
    /// Used verbatim when non-blank; the generator is skipped.
    pub custom_message: String,
    pub length: MessageLength,
    /// Number of generated variants. Custom messages and cache hits always yield one.
    pub variants: usize,
    /// Skip the cache lookup, e.g. when the user asked to regenerate.
    pub refresh: bool,
}

impl Default for ProposalRequest {
    fn default() -> Self {
        Self {
            commit_type: CommitType::default(),
            custom_message: String::new(),
            length: MessageLength::default(),
            variants: 1,
            refresh: false,
        }
    }
}

/// Suggested messages for the current changes plus the quest score.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub messages: Vec<CommitMessage>,
    pub summary: DiffSummary,
    pub score: ScoreResult,
}

/// A commit quest against one project directory.
pub struct Session {
    project_dir: PathBuf,
    config_store: ConfigStore,
    cache: MessageCache,
    generator: Arc<dyn TextGenerator>,
    options: SessionOptions,
    config: Option<ProjectConfig>,
    state: SessionState,
}

impl Session {
    /// Start a session. The directory must already exist.
    pub fn new(
        project_dir: impl Into<PathBuf>,
        generator: Arc<dyn TextGenerator>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let project_dir = project_dir.into();
        if !project_dir.is_dir() {
            return Err(SessionError::InvalidDirectory(project_dir));
        }

        Ok(Self {
            config_store: ConfigStore::new(&project_dir),
            cache: MessageCache::new(&project_dir),
            project_dir,
            generator,
            options,
            config: None,
            state: SessionState::NoConfig,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> Option<&ProjectConfig> {
        self.config.as_ref()
    }

    pub fn cache(&self) -> &MessageCache {
        &self.cache
    }

    /// Persist `config` for this project.
    pub fn setup(&mut self, config: ProjectConfig) -> Result<&ProjectConfig, SessionError> {
        self.config_store.save(&config)?;
        self.state = SessionState::Configured;
        Ok(self.config.insert(config))
    }

    /// Load the persisted config.
    pub fn load_config(&mut self) -> Result<&ProjectConfig, SessionError> {
        let config = self
            .config_store
            .load()?
            .ok_or_else(|| SessionError::ConfigMissing(self.project_dir.clone()))?;
        if self.state == SessionState::NoConfig {
            self.state = SessionState::Configured;
        }
        Ok(self.config.insert(config))
    }

    /// Make sure the project directory is a git repository.
    ///
    /// Without `init_if_missing` a missing repository fails the request with
    /// [`SessionError::RepoMissing`].
    pub fn open_repository(&mut self, init_if_missing: bool) -> Result<RepoStatus, SessionError> {
        if self.config.is_none() {
            self.load_config()?;
        }

        let status = match Workspace::discover(&self.project_dir)? {
            Some(_) => RepoStatus::Existing,
            None if init_if_missing => {
                Workspace::init(&self.project_dir)?;
                RepoStatus::Initialized
            }
            None => return Err(SessionError::RepoMissing(self.project_dir.clone())),
        };

        self.state = SessionState::RepoReady;
        Ok(status)
    }

    /// Summarize the unstaged changes and propose commit messages for them.
    ///
    /// May be called again from `AwaitingReview` to regenerate.
    pub async fn propose(&mut self, request: &ProposalRequest) -> Result<Proposal, SessionError> {
        if !matches!(
            self.state,
            SessionState::RepoReady | SessionState::AwaitingReview
        ) {
            self.open_repository(false)?;
        }

        let changes = self.unstaged_changes()?;
        if changes.is_empty() {
            return Err(SessionError::NoChanges);
        }

        let summaries: Vec<DiffSummary> = changes.iter().map(Change::summarize).collect();
        let summary = DiffSummary::combine(&summaries);
        let key = summary.canonical();
        debug!(files = changes.len(), summary = %key, "Summarized changes");

        let config = self.config.clone().unwrap_or_default();
        let messages = self.messages_for(request, &config, &key).await?;

        let score = score(
            &changes,
            &config.language,
            &config.specialization,
            &request.commit_type,
        );

        self.state = SessionState::AwaitingReview;
        Ok(Proposal {
            messages,
            summary,
            score,
        })
    }

    /// Accept `message`. With `auto_commit`, stage everything and commit it.
    ///
    /// Only valid while a proposal is awaiting review.
    pub fn accept(
        &mut self,
        message: &CommitMessage,
        auto_commit: bool,
    ) -> Result<Option<Oid>, SessionError> {
        if self.state != SessionState::AwaitingReview {
            return Err(SessionError::NotAwaitingReview(self.state));
        }

        let oid = if auto_commit {
            let workspace = Workspace::discover(&self.project_dir)
                .map_err(SessionError::AutoCommit)?
                .ok_or_else(|| SessionError::RepoMissing(self.project_dir.clone()))?;
            let oid = workspace
                .stage_all_and_commit(&message.text())
                .map_err(SessionError::AutoCommit)?;
            Some(oid)
        } else {
            None
        };

        self.state = SessionState::Committed;
        Ok(oid)
    }

    /// End the review without committing.
    pub fn decline(&mut self) {
        self.state = SessionState::Declined;
    }

    /// Unstaged changes, minus the session's own config and cache files.
    fn unstaged_changes(&self) -> Result<Vec<Change>, SessionError> {
        let workspace = Workspace::discover(&self.project_dir)?
            .ok_or_else(|| SessionError::RepoMissing(self.project_dir.clone()))?;
        let changes = workspace
            .unstaged_changes()?
            .into_iter()
            .filter(|change| !is_state_file(&change.file_path))
            .collect();
        Ok(changes)
    }

    async fn messages_for(
        &self,
        request: &ProposalRequest,
        config: &ProjectConfig,
        key: &str,
    ) -> Result<Vec<CommitMessage>, SessionError> {
        let generation = GenerationRequest {
            commit_type: &request.commit_type,
            custom_message: &request.custom_message,
            language: &config.language,
            framework: &config.framework,
            diff_summary: key,
            length: request.length,
        };

        if request.custom_message.trim().is_empty()
            && !request.refresh
            && let Some(hit) = self.cache.get(key, &request.commit_type)
        {
            return Ok(vec![hit]);
        }

        let variants = if request.custom_message.trim().is_empty() {
            request.variants.max(1)
        } else {
            1
        };

        let mut messages = Vec::with_capacity(variants);
        for _ in 0..variants {
            let message = retry_with_backoff(
                self.options.generation_attempts,
                || generate(self.generator.as_ref(), &generation),
                |e| GenerationError::RetriesExhausted(Box::new(e)),
            )
            .await?;
            messages.push(message);
        }

        if let Some(first) = messages.first()
            && first.source == MessageSource::Generated
            && let Err(e) = self.cache.put(key, first)
        {
            warn!("Failed to update message cache: {e}");
        }

        Ok(messages)
    }
}

fn is_state_file(path: &str) -> bool {
    path == CONFIG_FILE_NAME || path == CACHE_FILE_NAME
}
