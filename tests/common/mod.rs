//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use commit_quest::config::{ConfigStore, ProjectConfig};
use commit_quest::error::GenerationError;
use commit_quest::llm::TextGenerator;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory, with a committer identity.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    /// Create a repository that already has a project config.
    pub fn configured(language: &str, framework: &str, specialization: &str) -> Self {
        let test_repo = Self::new();
        ConfigStore::new(test_repo.path())
            .save(&ProjectConfig::new(language, framework, specialization))
            .expect("Failed to save project config");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the repository root, creating parent directories.
    pub fn write_file(&self, relative: &str, contents: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, contents).expect("Failed to write file");
    }

    /// Blank out the committer identity so git refuses to build a signature.
    ///
    /// The repo-local values take precedence over any global identity.
    pub fn clear_identity(&self) {
        let mut config = self.repo.config().expect("Failed to open repo config");
        config
            .set_str("user.name", "")
            .expect("Failed to clear user.name");
        config
            .set_str("user.email", "")
            .expect("Failed to clear user.email");
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Stage everything and commit it. Returns the commit OID.
    pub fn commit_all(&self, message: &str) -> Oid {
        let sig = self.signature();
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .expect("Failed to add files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Number of commits reachable from HEAD (0 for an unborn branch).
    pub fn commit_count(&self) -> usize {
        let Ok(mut revwalk) = self.repo.revwalk() else {
            return 0;
        };
        if revwalk.push_head().is_err() {
            return 0;
        }
        revwalk.count()
    }

    /// Message of the HEAD commit.
    pub fn head_message(&self) -> String {
        self.repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map(|c| c.message().unwrap_or_default().to_string())
            .expect("Repository has no HEAD commit")
    }
}

/// Deterministic text generator that records the prompts it receives.
pub struct StubGenerator {
    reply: Result<String, String>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl StubGenerator {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A generator whose every call fails like a model that returned nothing usable.
    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock poisoned").len()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((prompt.to_string(), max_tokens));
        self.reply
            .clone()
            .map_err(GenerationError::MalformedResponse)
    }
}
