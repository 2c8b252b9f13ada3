//! Branch selection at startup

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::git::{BranchSet, Vcs, VcsError};
use crate::progress::Reporter;
use crate::prompt::Prompter;

/// Lists local branches and switches between them
#[derive(Clone)]
pub struct BranchSelector {
    vcs: Arc<dyn Vcs>,
    prompter: Arc<dyn Prompter>,
    reporter: Arc<dyn Reporter>,
}

impl BranchSelector {
    pub fn new(vcs: Arc<dyn Vcs>, prompter: Arc<dyn Prompter>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            vcs,
            prompter,
            reporter,
        }
    }

    pub async fn list_branches(&self) -> Result<BranchSet, VcsError> {
        debug!("BranchSelector::list_branches: called");
        self.vcs.branches().await
    }

    /// Check out `name`; on failure the working tree stays on its current branch
    pub async fn switch_branch(&self, name: &str) -> bool {
        debug!(%name, "BranchSelector::switch_branch: called");
        self.reporter.start(&format!("Switching to {}", name));
        match self.vcs.checkout(name).await {
            Ok(()) => {
                info!(branch = %name, "Switched branch");
                self.reporter.succeed(&format!("Switched to branch {}", name));
                true
            }
            Err(e) => {
                warn!(branch = %name, error = %e, "Failed to switch branch");
                self.reporter
                    .fail(&format!("Could not switch to {}, staying on current branch: {}", name, e));
                false
            }
        }
    }

    /// Ask the operator which branch to work on and switch to it
    ///
    /// Returns the branch autopush ends up on, or `None` when branches could
    /// not be listed. Every failure is reported and startup continues.
    pub async fn select_branch(&self) -> Option<String> {
        debug!("BranchSelector::select_branch: called");
        let set = match self.list_branches().await {
            Ok(set) => set,
            Err(e) => {
                warn!(error = %e, "Failed to list branches");
                self.reporter.fail(&format!("Could not list branches: {}", e));
                return None;
            }
        };

        let chosen = match self
            .prompter
            .select("Select a branch to work on:", &set.all, &set.current)
        {
            Ok(chosen) => chosen,
            Err(e) => {
                warn!(error = %e, "Branch prompt failed");
                self.reporter
                    .info(&format!("Staying on {} (branch selection skipped: {})", set.current, e));
                return Some(set.current);
            }
        };

        if chosen == set.current {
            debug!(branch = %chosen, "BranchSelector::select_branch: already on chosen branch");
            self.reporter.info(&format!("Working on branch {}", chosen));
            return Some(chosen);
        }

        if self.switch_branch(&chosen).await {
            Some(chosen)
        } else {
            Some(set.current)
        }
    }
}
