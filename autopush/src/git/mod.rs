//! Git integration
//!
//! Everything autopush asks of version control goes through the [`Vcs`] trait.
//! [`GitCli`] implements it by running the `git` binary in the working
//! directory; tests substitute `mock::MockVcs`.

mod cli;
mod error;

#[cfg(test)]
pub mod mock;

use std::fmt;

use async_trait::async_trait;

pub use cli::{GitCli, parse_porcelain};
pub use error::{FailureKind, VcsError};

/// A path with uncommitted changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Path relative to the repository root
    pub path: String,

    /// Two-letter porcelain status code (index, worktree), e.g. `" M"` or `"??"`
    pub status: String,

    /// Source path when the entry is a rename or copy
    pub original_path: Option<String>,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: status.into(),
            original_path: None,
        }
    }

    /// Paths a commit of this change must name; a rename includes its source
    pub fn pathspec(&self) -> Vec<String> {
        let mut paths = vec![self.path.clone()];
        if let Some(original) = &self.original_path {
            paths.push(original.clone());
        }
        paths
    }
}

impl fmt::Display for ChangedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.original_path {
            Some(original) => write!(f, "{} {} -> {}", self.status, original, self.path),
            None => write!(f, "{} {}", self.status, self.path),
        }
    }
}

/// Local branches and the one currently checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSet {
    pub all: Vec<String>,
    pub current: String,
}

/// Where a push goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    /// Plain `git push` to the configured upstream
    Upstream,
    /// `git push <remote> <branch> -u`, setting the upstream on success
    SetUpstream { remote: String, branch: String },
}

/// How a pull integrates remote history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullMode {
    /// Merge, allowing histories with no common ancestor
    MergeUnrelated,
    /// Rebase local commits onto the remote branch
    Rebase,
}

/// Version control operations consumed by autopush
///
/// Implementations are bound to one working directory for their whole
/// lifetime. Failures carry a [`FailureKind`] so callers never inspect text.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether the working directory is inside a repository
    async fn is_repository(&self) -> Result<bool, VcsError>;

    /// Paths with uncommitted changes, in the order git reports them
    async fn status(&self) -> Result<Vec<ChangedFile>, VcsError>;

    /// Stage the given paths, including deletions
    async fn stage(&self, paths: &[String]) -> Result<(), VcsError>;

    /// Commit the given paths with a message
    async fn commit(&self, message: &str, paths: &[String]) -> Result<(), VcsError>;

    async fn push(&self, target: &PushTarget) -> Result<(), VcsError>;

    async fn pull(&self, remote: &str, branch: &str, mode: PullMode) -> Result<(), VcsError>;

    /// Names of configured remotes
    async fn remotes(&self) -> Result<Vec<String>, VcsError>;

    async fn add_remote(&self, name: &str, url: &str) -> Result<(), VcsError>;

    async fn branches(&self) -> Result<BranchSet, VcsError>;

    async fn checkout(&self, branch: &str) -> Result<(), VcsError>;

    async fn current_branch(&self) -> Result<String, VcsError>;
}
