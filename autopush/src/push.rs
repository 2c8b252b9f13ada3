//! Push reconciliation
//!
//! Pushing the current branch can fail because it has no upstream, because no
//! remote is configured at all, or because the remote moved ahead. The
//! reconciler walks an explicit state machine of recovery strategies until the
//! push lands or a terminal failure is reached:
//!
//! ```text
//! AttemptPush ──ok──────────────────────────────────────────────► Done
//!   │ no upstream                  │ remote ahead
//!   ▼                              ▼
//! NoUpstream                  RemoteAheadSimple ── pull --rebase, push
//!   │ remote exists  │ missing
//!   ▼                ▼
//! LinkUpstream   PromptForRemote ── skipped ──► Done(NoRemoteConfigured)
//!   │ failed         │ remote added
//!   ▼                ▼
//!   └──────────► SyncWithRemote ── remote ahead ──► Reconcile ──► RebaseReconcile
//! ```
//!
//! Every terminal state is reported; none is returned as an error.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::git::{FailureKind, PullMode, PushTarget, Vcs, VcsError};
use crate::progress::Reporter;
use crate::prompt::Prompter;

/// Default name of the remote used when setting up an upstream
pub const DEFAULT_REMOTE: &str = "origin";

/// Terminal result of a push attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The branch is on the remote
    Pushed,
    /// No remote exists and the operator declined to add one
    NoRemoteConfigured,
    /// The remote was ahead and a rebase onto it failed; the operator must pull manually
    RemoteAhead(String),
    /// Any other failure; the operator must resolve it manually
    Fatal(String),
}

impl PushOutcome {
    pub fn is_pushed(&self) -> bool {
        matches!(self, Self::Pushed)
    }
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pushed => write!(f, "pushed"),
            Self::NoRemoteConfigured => write!(f, "no remote configured"),
            Self::RemoteAhead(msg) => write!(f, "remote ahead: {}", msg),
            Self::Fatal(msg) => write!(f, "fatal: {}", msg),
        }
    }
}

/// States of the reconciliation machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushState {
    AttemptPush,
    NoUpstream,
    LinkUpstream,
    PromptForRemote,
    SyncWithRemote { branch: Option<String> },
    Reconcile { branch: String },
    RebaseReconcile { branch: String },
    RemoteAheadSimple,
    Done(PushOutcome),
}

/// Pushes the current branch, recovering from common rejections
#[derive(Clone)]
pub struct PushReconciler {
    vcs: Arc<dyn Vcs>,
    prompter: Arc<dyn Prompter>,
    reporter: Arc<dyn Reporter>,
    remote: String,
}

impl PushReconciler {
    pub fn new(vcs: Arc<dyn Vcs>, prompter: Arc<dyn Prompter>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            vcs,
            prompter,
            reporter,
            remote: DEFAULT_REMOTE.to_string(),
        }
    }

    /// Use a remote other than `origin` for upstream setup and syncing
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Push the current branch, escalating through recovery strategies
    pub async fn push_changes(&self) -> PushOutcome {
        debug!(remote = %self.remote, "PushReconciler::push_changes: called");
        self.reporter.start("Pushing changes");

        let mut state = PushState::AttemptPush;
        let outcome = loop {
            debug!(?state, "PushReconciler::push_changes: entering state");
            state = match state {
                PushState::Done(outcome) => break outcome,
                other => self.step(other).await,
            };
        };

        self.report(&outcome);
        outcome
    }

    /// Run one state and return the next
    pub async fn step(&self, state: PushState) -> PushState {
        match state {
            PushState::AttemptPush => self.attempt_push().await,
            PushState::NoUpstream => self.no_upstream().await,
            PushState::LinkUpstream => self.link_upstream().await,
            PushState::PromptForRemote => self.prompt_for_remote().await,
            PushState::SyncWithRemote { branch } => self.sync_with_remote(branch).await,
            PushState::Reconcile { branch } => self.reconcile(branch).await,
            PushState::RebaseReconcile { branch } => self.rebase_reconcile(branch).await,
            PushState::RemoteAheadSimple => self.remote_ahead_simple().await,
            done @ PushState::Done(_) => done,
        }
    }

    async fn attempt_push(&self) -> PushState {
        debug!("PushReconciler::attempt_push: called");
        match self.vcs.push(&PushTarget::Upstream).await {
            Ok(()) => PushState::Done(PushOutcome::Pushed),
            Err(e) => match e.kind() {
                FailureKind::NoUpstream => {
                    info!("No upstream configured for the current branch");
                    self.reporter.update("No upstream branch, setting one up");
                    PushState::NoUpstream
                }
                FailureKind::RemoteAhead => {
                    info!("Remote is ahead of the local branch");
                    self.reporter.update("Remote has new commits, rebasing onto it");
                    PushState::RemoteAheadSimple
                }
                FailureKind::RemoteExists | FailureKind::Other => fatal("Push failed", &e),
            },
        }
    }

    async fn no_upstream(&self) -> PushState {
        debug!("PushReconciler::no_upstream: called");
        let remotes = match self.vcs.remotes().await {
            Ok(remotes) => remotes,
            Err(e) => {
                warn!(error = %e, "Failed to list remotes, treating as none");
                Vec::new()
            }
        };

        if remotes.iter().any(|r| *r == self.remote) {
            debug!(remote = %self.remote, "PushReconciler::no_upstream: remote exists");
            PushState::LinkUpstream
        } else {
            debug!(remote = %self.remote, "PushReconciler::no_upstream: remote missing");
            PushState::PromptForRemote
        }
    }

    async fn link_upstream(&self) -> PushState {
        debug!("PushReconciler::link_upstream: called");
        let branch = match self.vcs.current_branch().await {
            Ok(branch) => branch,
            Err(e) => return fatal("Could not determine the current branch", &e),
        };

        self.reporter
            .update(&format!("Linking {} to {}/{}", branch, self.remote, branch));
        match self.vcs.push(&self.set_upstream(&branch)).await {
            Ok(()) => PushState::Done(PushOutcome::Pushed),
            Err(e) => {
                // Sync against the existing remote; no URL is needed
                warn!(error = %e, "Linking upstream failed, syncing with existing remote");
                PushState::SyncWithRemote { branch: Some(branch) }
            }
        }
    }

    async fn prompt_for_remote(&self) -> PushState {
        debug!("PushReconciler::prompt_for_remote: called");
        let message = format!(
            "No '{}' remote configured. Enter a remote URL (leave empty to skip):",
            self.remote
        );
        let url = match self.prompter.input(&message) {
            Ok(url) => url.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Remote URL prompt failed, skipping push");
                String::new()
            }
        };

        if url.is_empty() {
            debug!("PushReconciler::prompt_for_remote: operator skipped");
            return PushState::Done(PushOutcome::NoRemoteConfigured);
        }

        match self.vcs.add_remote(&self.remote, &url).await {
            Ok(()) => {
                info!(remote = %self.remote, %url, "Added remote");
                self.reporter.update(&format!("Added remote {} -> {}", self.remote, url));
            }
            Err(e) if e.is_remote_exists() => {
                debug!("PushReconciler::prompt_for_remote: remote already exists, continuing");
            }
            Err(e) => return fatal("Failed to add remote", &e),
        }

        PushState::SyncWithRemote { branch: None }
    }

    async fn sync_with_remote(&self, branch: Option<String>) -> PushState {
        debug!(?branch, "PushReconciler::sync_with_remote: called");
        let branch = match branch {
            Some(branch) => branch,
            None => match self.vcs.current_branch().await {
                Ok(branch) => branch,
                Err(e) => return fatal("Could not determine the current branch", &e),
            },
        };

        match self.vcs.push(&self.set_upstream(&branch)).await {
            Ok(()) => PushState::Done(PushOutcome::Pushed),
            Err(e) if e.is_remote_ahead() => {
                info!(%branch, "Remote history diverged, reconciling");
                self.reporter.update("Remote history diverged, merging remote changes");
                PushState::Reconcile { branch }
            }
            Err(e) => fatal("Push to remote failed", &e),
        }
    }

    async fn reconcile(&self, branch: String) -> PushState {
        debug!(%branch, "PushReconciler::reconcile: called");
        match self.pull_then_push(&branch, PullMode::MergeUnrelated).await {
            Ok(()) => PushState::Done(PushOutcome::Pushed),
            Err(e) => {
                warn!(error = %e, "Merge reconciliation failed, trying rebase");
                self.reporter.update("Merge failed, rebasing onto remote");
                PushState::RebaseReconcile { branch }
            }
        }
    }

    async fn rebase_reconcile(&self, branch: String) -> PushState {
        debug!(%branch, "PushReconciler::rebase_reconcile: called");
        match self.pull_then_push(&branch, PullMode::Rebase).await {
            Ok(()) => PushState::Done(PushOutcome::Pushed),
            Err(e) => fatal("Could not sync with remote; resolve manually", &e),
        }
    }

    async fn remote_ahead_simple(&self) -> PushState {
        debug!("PushReconciler::remote_ahead_simple: called");
        let result = async {
            let branch = self.vcs.current_branch().await?;
            self.vcs.pull(&self.remote, &branch, PullMode::Rebase).await?;
            self.vcs.push(&PushTarget::Upstream).await
        }
        .await;

        match result {
            Ok(()) => PushState::Done(PushOutcome::Pushed),
            Err(e) => {
                warn!(error = %e, "Rebase onto remote failed");
                PushState::Done(PushOutcome::RemoteAhead(e.to_string()))
            }
        }
    }

    async fn pull_then_push(&self, branch: &str, mode: PullMode) -> Result<(), VcsError> {
        self.vcs.pull(&self.remote, branch, mode).await?;
        self.vcs.push(&self.set_upstream(branch)).await
    }

    fn set_upstream(&self, branch: &str) -> PushTarget {
        PushTarget::SetUpstream {
            remote: self.remote.clone(),
            branch: branch.to_string(),
        }
    }

    fn report(&self, outcome: &PushOutcome) {
        match outcome {
            PushOutcome::Pushed => self.reporter.succeed("Changes pushed"),
            PushOutcome::NoRemoteConfigured => self.reporter.succeed("No remote configured, skipped push"),
            PushOutcome::RemoteAhead(msg) => self.reporter.fail(&format!(
                "Remote is ahead and rebasing failed; pull manually: {}",
                msg
            )),
            PushOutcome::Fatal(msg) => self.reporter.fail(msg),
        }
    }
}

fn fatal(context: &str, err: &VcsError) -> PushState {
    warn!(error = %err, "{}", context);
    PushState::Done(PushOutcome::Fatal(format!("{}: {}", context, err)))
}
