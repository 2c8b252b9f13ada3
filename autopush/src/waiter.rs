//! Threshold waiter
//!
//! Polls the working tree until enough files have changed to make a batch.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::git::ChangedFile;
use crate::status::StatusReader;

/// Default number of changed files that triggers a batch
pub const DEFAULT_THRESHOLD: usize = 5;

/// Default time between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default wait after a failed status read before the next cycle
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Waits for the changed-file count to reach a threshold
#[derive(Clone)]
pub struct ThresholdWaiter {
    reader: StatusReader,
    poll_interval: Duration,
}

impl ThresholdWaiter {
    pub fn new(reader: StatusReader) -> Self {
        Self {
            reader,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sleep and poll until at least `threshold` files changed; returns that poll's files
    ///
    /// Never times out. Polls run one after another, so two can never overlap.
    /// Failed status reads are logged and the wait goes on.
    pub async fn wait_for_threshold(&self, threshold: usize) -> Vec<ChangedFile> {
        debug!(threshold, interval = ?self.poll_interval, "ThresholdWaiter::wait_for_threshold: called");
        info!(threshold, "Waiting for changes");

        let mut polls = 0u64;
        loop {
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            match self.reader.read_status().await {
                Ok(files) if files.len() >= threshold => {
                    info!(count = files.len(), polls, "Change threshold reached");
                    return files;
                }
                Ok(files) => {
                    debug!(count = files.len(), threshold, polls, "ThresholdWaiter: below threshold");
                }
                Err(e) => {
                    warn!(error = %e, "Status read failed while waiting, will retry");
                }
            }
        }
    }
}
