//! Working tree access: per-file unstaged patches and the auto-commit.

use std::path::{Path, PathBuf};

use git2::{DiffOptions, ErrorCode, IndexAddOption, Oid, Patch, Repository};
use tracing::{debug, warn};

use crate::commit::Change;
use crate::error::GitError;

/// A non-bare git repository rooted at a project directory.
pub struct Workspace {
    repo: Repository,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Workspace {
    /// Open the repository at `dir`.
    ///
    /// Returns `Ok(None)` when `dir` is not a repository. Parent directories
    /// are not searched, so a project nested inside another checkout still
    /// counts as missing.
    pub fn discover(dir: &Path) -> Result<Option<Self>, GitError> {
        let repo = match Repository::open(dir) {
            Ok(repo) => repo,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(source) => {
                return Err(GitError::OpenRepository {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };

        if repo.is_bare() {
            return Err(GitError::BareRepository);
        }
        Ok(Some(Self { repo }))
    }

    /// Create a new repository at `dir`.
    pub fn init(dir: &Path) -> Result<Self, GitError> {
        let repo = Repository::init(dir).map_err(GitError::InitRepository)?;
        debug!(path = %dir.display(), "Initialized git repository");
        Ok(Self { repo })
    }

    /// Working directory of the repository.
    pub fn workdir(&self) -> PathBuf {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.repo.path().to_path_buf())
    }

    /// Unstaged changes (index to working tree, untracked files included), one per file.
    pub fn unstaged_changes(&self) -> Result<Vec<Change>, GitError> {
        let mut opts = DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);

        let diff = self
            .repo
            .diff_index_to_workdir(None, Some(&mut opts))
            .map_err(GitError::DiffFailed)?;

        let mut changes = Vec::with_capacity(diff.deltas().len());
        for (idx, delta) in diff.deltas().enumerate() {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();
            if path.is_empty() {
                continue;
            }

            let raw_diff = match Patch::from_diff(&diff, idx).map_err(GitError::DiffFailed)? {
                Some(mut patch) => {
                    let buf = patch.to_buf().map_err(GitError::DiffFailed)?;
                    match buf.as_str() {
                        Some(text) => text.to_string(),
                        None => {
                            warn!("Diff for {path} is not valid UTF-8, using lossy conversion");
                            String::from_utf8_lossy(&buf).to_string()
                        }
                    }
                }
                None => String::new(),
            };

            changes.push(Change::new(path, raw_diff));
        }

        debug!("Collected {} unstaged change(s)", changes.len());
        Ok(changes)
    }

    /// Stage every change (including deletions and new files) and commit it.
    ///
    /// Works on a repository without commits: the first commit has no parent.
    pub fn stage_all_and_commit(&self, message: &str) -> Result<Oid, GitError> {
        let mut index = self.repo.index().map_err(GitError::StagingFailed)?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(GitError::StagingFailed)?;
        index
            .update_all(["*"].iter(), None)
            .map_err(GitError::StagingFailed)?;
        index.write().map_err(GitError::StagingFailed)?;

        let tree_id = index.write_tree().map_err(GitError::StagingFailed)?;
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(GitError::CommitFailed)?;

        let sig = self.repo.signature().map_err(GitError::ConfigError)?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(GitError::CommitFailed)?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                None
            }
            Err(e) => return Err(GitError::CommitFailed(e)),
        };
        let parents: Vec<_> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(GitError::CommitFailed)?;

        debug!(%oid, "Created commit");
        Ok(oid)
    }
}
