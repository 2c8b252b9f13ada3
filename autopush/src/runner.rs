//! Main loop
//!
//! Composes the components into the autopush cycle: pick a branch once, then
//! forever read status, wait for enough changes, commit a batch and push.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::branch::BranchSelector;
use crate::commit::{BatchCommitter, BatchReport};
use crate::config::Config;
use crate::git::Vcs;
use crate::progress::Reporter;
use crate::prompt::Prompter;
use crate::push::{PushOutcome, PushReconciler};
use crate::status::StatusReader;
use crate::waiter::ThresholdWaiter;

/// Result of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Status could not be read; the cycle was abandoned
    StatusFailed(String),
    /// Nothing changed (single-cycle mode only)
    NothingToDo,
    /// A batch was committed and a push attempted
    Completed { report: BatchReport, push: PushOutcome },
}

/// Cycle tuning taken from [`Config`]
#[derive(Debug, Clone)]
struct LoopSettings {
    threshold: usize,
    batch_size: usize,
    retry_interval: Duration,
    select_branch: bool,
}

/// The autopush session
pub struct AutoPush {
    reader: StatusReader,
    waiter: ThresholdWaiter,
    committer: BatchCommitter,
    reconciler: PushReconciler,
    selector: BranchSelector,
    reporter: Arc<dyn Reporter>,
    settings: LoopSettings,
}

impl AutoPush {
    /// Wire every component to one VCS session
    pub fn new(vcs: Arc<dyn Vcs>, prompter: Arc<dyn Prompter>, reporter: Arc<dyn Reporter>, config: &Config) -> Self {
        debug!(?config, "AutoPush::new: called");
        let reader = StatusReader::new(vcs.clone());
        Self {
            waiter: ThresholdWaiter::new(reader.clone()).with_poll_interval(config.poll_interval()),
            reader,
            committer: BatchCommitter::new(vcs.clone(), reporter.clone()),
            reconciler: PushReconciler::new(vcs.clone(), prompter.clone(), reporter.clone())
                .with_remote(config.remote.clone()),
            selector: BranchSelector::new(vcs, prompter, reporter.clone()),
            reporter,
            settings: LoopSettings {
                threshold: config.threshold,
                batch_size: config.batch_size,
                retry_interval: config.retry_interval(),
                select_branch: config.select_branch,
            },
        }
    }

    /// Startup step: let the operator pick a branch
    pub async fn start(&self) -> Option<String> {
        if !self.settings.select_branch {
            debug!("AutoPush::start: branch selection disabled");
            return None;
        }
        self.selector.select_branch().await
    }

    /// Run forever; only external termination stops it
    pub async fn run(&self) {
        info!(
            threshold = self.settings.threshold,
            batch_size = self.settings.batch_size,
            "autopush started"
        );
        self.start().await;

        loop {
            self.run_cycle().await;
        }
    }

    /// One cycle: status, wait for threshold if needed, commit, push
    pub async fn run_cycle(&self) -> CycleOutcome {
        debug!("AutoPush::run_cycle: called");
        let files = match self.reader.read_status().await {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "Status read failed, retrying later");
                self.reporter.fail(&format!(
                    "Could not read repository status, retrying in {}s: {}",
                    self.settings.retry_interval.as_secs(),
                    e
                ));
                tokio::time::sleep(self.settings.retry_interval).await;
                return CycleOutcome::StatusFailed(e.to_string());
            }
        };

        let files = if files.len() >= self.settings.threshold {
            files
        } else {
            self.reporter.info(&format!(
                "{} changed file(s), waiting for {}",
                files.len(),
                self.settings.threshold
            ));
            self.waiter.wait_for_threshold(self.settings.threshold).await
        };

        self.commit_and_push(&files).await
    }

    /// Single-cycle mode: commit whatever changed without waiting, then push
    pub async fn run_once(&self) -> CycleOutcome {
        debug!("AutoPush::run_once: called");
        let files = match self.reader.read_status().await {
            Ok(files) => files,
            Err(e) => {
                self.reporter.fail(&format!("Could not read repository status: {}", e));
                return CycleOutcome::StatusFailed(e.to_string());
            }
        };

        if files.is_empty() {
            self.reporter.info("No changes to commit");
            return CycleOutcome::NothingToDo;
        }

        self.commit_and_push(&files).await
    }

    async fn commit_and_push(&self, files: &[crate::git::ChangedFile]) -> CycleOutcome {
        let report = self.committer.commit_batch(files, self.settings.batch_size).await;
        let push = self.reconciler.push_changes().await;

        info!(
            committed = report.committed.len(),
            failed = report.failed.len(),
            push = %push,
            "Cycle finished"
        );
        CycleOutcome::Completed { report, push }
    }
}
