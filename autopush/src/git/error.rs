//! Git failure taxonomy
//!
//! `git` only reports failures as human-readable text on stderr. Every failure
//! is tagged with a [`FailureKind`] here, at the integration boundary, so the
//! rest of the crate matches on tags instead of strings.

use tracing::debug;

/// Substrings reported when a branch has nowhere to push by default
const NO_UPSTREAM_PATTERNS: &[&str] = &["no configured push destination", "no upstream branch"];

/// Substrings reported when the remote has commits the local branch lacks
const REMOTE_AHEAD_PATTERNS: &[&str] = &["fetch first", "rejected", "divergent branches", "non-fast-forward"];

/// Substrings reported when adding a remote whose name is taken
const REMOTE_EXISTS_PATTERNS: &[&str] = &["already exists"];

/// Substrings reported when the working directory is not inside a repository
const NOT_A_REPOSITORY_PATTERNS: &[&str] = &["not a git repository"];

/// Category of a failed git command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The branch has no upstream or the repository has no push destination
    NoUpstream,
    /// The remote is ahead of or has diverged from the local branch
    RemoteAhead,
    /// A remote with the requested name is already configured
    RemoteExists,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Classify git error output
    ///
    /// Upstream problems are checked first: git can mention "rejected" in the
    /// same message as a missing upstream hint.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        let kind = if contains_any(&lower, NO_UPSTREAM_PATTERNS) {
            Self::NoUpstream
        } else if contains_any(&lower, REMOTE_AHEAD_PATTERNS) {
            Self::RemoteAhead
        } else if contains_any(&lower, REMOTE_EXISTS_PATTERNS) {
            Self::RemoteExists
        } else {
            Self::Other
        };
        debug!(?kind, "FailureKind::classify: classified");
        kind
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Error types for git operations
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("git {command} failed: {stderr}")]
    CommandFailed {
        command: String,
        stderr: String,
        kind: FailureKind,
    },

    #[error("Failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
}

impl VcsError {
    /// Build an error from a failed command, classifying its output
    pub fn command_failed(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        let command = command.into();
        let stderr = stderr.into();

        if contains_any(&stderr.to_lowercase(), NOT_A_REPOSITORY_PATTERNS) {
            return Self::NotARepository(stderr.trim().to_string());
        }

        let kind = FailureKind::classify(&stderr);
        Self::CommandFailed { command, stderr, kind }
    }

    /// Category of this failure
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::CommandFailed { kind, .. } => *kind,
            Self::NotARepository(_) | Self::Spawn(_) => FailureKind::Other,
        }
    }

    /// Whether the remote rejected the push because it has newer history
    pub fn is_remote_ahead(&self) -> bool {
        self.kind() == FailureKind::RemoteAhead
    }

    /// Whether the branch has nowhere to push by default
    pub fn is_no_upstream(&self) -> bool {
        self.kind() == FailureKind::NoUpstream
    }

    /// Whether a remote with the same name already exists
    pub fn is_remote_exists(&self) -> bool {
        self.kind() == FailureKind::RemoteExists
    }
}
