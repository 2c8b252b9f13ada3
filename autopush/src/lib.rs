//! autopush - batch commits and keep a remote in sync
//!
//! autopush watches a git working tree, waits until enough files have changed,
//! commits them one file per commit, and pushes. When a push is rejected it
//! works through a fixed sequence of recovery strategies (setting an upstream,
//! adding a remote, merging or rebasing onto the remote) before giving up and
//! leaving the repository to the operator.
//!
//! # Modules
//!
//! - [`git`] - `Vcs` trait, git CLI implementation and failure taxonomy
//! - [`status`] - Changed-file listing
//! - [`commit`] - Per-file batch commits
//! - [`push`] - Push reconciliation state machine
//! - [`waiter`] - Threshold polling
//! - [`branch`] - Startup branch selection
//! - [`runner`] - The main loop
//! - [`prompt`] / [`progress`] - Operator interaction
//! - [`config`] / [`cli`] - Configuration and command line

pub mod branch;
pub mod cli;
pub mod commit;
pub mod config;
pub mod git;
pub mod progress;
pub mod prompt;
pub mod push;
pub mod runner;
pub mod status;
pub mod waiter;

// Re-export commonly used types
pub use branch::BranchSelector;
pub use commit::{BatchCommitter, BatchReport, DEFAULT_BATCH_SIZE, commit_message};
pub use config::Config;
pub use git::{BranchSet, ChangedFile, FailureKind, GitCli, PullMode, PushTarget, Vcs, VcsError};
pub use progress::{ConsoleReporter, Reporter};
pub use prompt::{Prompter, TerminalPrompter};
pub use push::{DEFAULT_REMOTE, PushOutcome, PushReconciler, PushState};
pub use runner::{AutoPush, CycleOutcome};
pub use status::StatusReader;
pub use waiter::{DEFAULT_POLL_INTERVAL, DEFAULT_THRESHOLD, ThresholdWaiter};
