//! Batch committer
//!
//! Each changed file becomes its own commit: the path is staged and then
//! committed alone, with a message naming the file and the time of the
//! attempt. A failure on one file never stops the rest of the batch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::git::{ChangedFile, Vcs, VcsError};
use crate::progress::Reporter;

/// Default number of files committed per batch
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Outcome of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Paths committed, in order
    pub committed: Vec<String>,

    /// Paths that failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    /// Number of files a commit was attempted for
    pub fn attempted(&self) -> usize {
        self.committed.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempted() == 0
    }
}

/// Build the commit message for one file
pub fn commit_message(path: &str, at: DateTime<Utc>) -> String {
    format!("Auto-commit {} at {}", path, at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Stages and commits changed files one at a time
#[derive(Clone)]
pub struct BatchCommitter {
    vcs: Arc<dyn Vcs>,
    reporter: Arc<dyn Reporter>,
}

impl BatchCommitter {
    pub fn new(vcs: Arc<dyn Vcs>, reporter: Arc<dyn Reporter>) -> Self {
        Self { vcs, reporter }
    }

    /// Commit the first `limit` files individually; a `limit` of 0 commits all of them
    pub async fn commit_batch(&self, files: &[ChangedFile], limit: usize) -> BatchReport {
        debug!(count = files.len(), limit, "BatchCommitter::commit_batch: called");
        let mut report = BatchReport::default();

        if files.is_empty() {
            debug!("BatchCommitter::commit_batch: nothing to commit");
            self.reporter.info("No changes to commit");
            return report;
        }

        let take = if limit == 0 { files.len() } else { limit.min(files.len()) };
        self.reporter
            .start(&format!("Committing {} of {} changed file(s)", take, files.len()));

        let mut seen = HashSet::new();
        for file in &files[..take] {
            if !seen.insert(file.path.as_str()) {
                debug!(path = %file.path, "BatchCommitter::commit_batch: duplicate path, skipping");
                continue;
            }

            match self.commit_file(file).await {
                Ok(()) => {
                    self.reporter.update(&format!("Committed {}", file.path));
                    report.committed.push(file.path.clone());
                }
                Err(e) => {
                    warn!(path = %file.path, error = %e, "Failed to commit file");
                    self.reporter.update(&format!("Failed to commit {}: {}", file.path, e));
                    report.failed.push((file.path.clone(), e.to_string()));
                }
            }
        }

        if report.failed.is_empty() {
            self.reporter
                .succeed(&format!("Committed {} file(s)", report.committed.len()));
        } else {
            self.reporter.fail(&format!(
                "Committed {} file(s), {} failed",
                report.committed.len(),
                report.failed.len()
            ));
        }

        info!(
            committed = report.committed.len(),
            failed = report.failed.len(),
            "Batch finished"
        );
        report
    }

    async fn commit_file(&self, file: &ChangedFile) -> Result<(), VcsError> {
        debug!(%file, "BatchCommitter::commit_file: called");
        // A rename's source is already gone from the index; only the commit names it
        self.vcs.stage(std::slice::from_ref(&file.path)).await?;
        self.vcs
            .commit(&commit_message(&file.path, Utc::now()), &file.pathspec())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{Call, MockVcs};
    use crate::progress::mock::{Event, RecordingReporter};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn files(n: usize) -> Vec<ChangedFile> {
        (0..n).map(|i| ChangedFile::new(format!("file{}.txt", i), "??")).collect()
    }

    fn committer(vcs: &Arc<MockVcs>) -> (BatchCommitter, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::new());
        (BatchCommitter::new(vcs.clone(), reporter.clone()), reporter)
    }

    #[test]
    fn test_commit_message_contains_path_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            commit_message("src/main.rs", at),
            "Auto-commit src/main.rs at 2024-03-09T14:05:07.000Z"
        );
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let vcs = Arc::new(MockVcs::new());
        let (committer, reporter) = committer(&vcs);

        let report = committer.commit_batch(&[], 5).await;

        assert!(report.is_empty());
        assert!(vcs.calls().is_empty());
        assert_eq!(reporter.events(), vec![Event::Info("No changes to commit".to_string())]);
    }

    #[tokio::test]
    async fn test_batch_commits_prefix_in_order() {
        let vcs = Arc::new(MockVcs::new());
        let (committer, _reporter) = committer(&vcs);

        let report = committer.commit_batch(&files(7), 5).await;

        assert_eq!(
            report.committed,
            (0..5).map(|i| format!("file{}.txt", i)).collect::<Vec<_>>()
        );
        let calls = vcs.calls();
        assert_eq!(calls.len(), 10);
        for (i, pair) in calls.chunks(2).enumerate() {
            let path = vec![format!("file{}.txt", i)];
            assert_eq!(pair[0], Call::Stage(path.clone()));
            match &pair[1] {
                Call::Commit { message, paths } => {
                    assert_eq!(paths, &path);
                    assert!(message.contains(&path[0]));
                }
                other => panic!("Expected commit, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_zero_limit_commits_everything() {
        let vcs = Arc::new(MockVcs::new());
        let (committer, _reporter) = committer(&vcs);

        let report = committer.commit_batch(&files(8), 0).await;
        assert_eq!(report.committed.len(), 8);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let vcs = Arc::new(
            MockVcs::new()
                .with_stage_error("file1.txt", "fatal: pathspec 'file1.txt' did not match any files")
                .with_commit_error("file2.txt", "error: unable to create index.lock"),
        );
        let (committer, reporter) = committer(&vcs);

        let report = committer.commit_batch(&files(4), 5).await;

        assert_eq!(report.committed, vec!["file0.txt".to_string(), "file3.txt".to_string()]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, "file1.txt");
        assert_eq!(report.failed[1].0, "file2.txt");

        // No commit is attempted after a failed stage
        assert_eq!(
            vcs.count(|c| matches!(c, Call::Commit { paths, .. } if paths[0] == "file1.txt")),
            0
        );
        assert_eq!(reporter.failures(), vec!["Committed 2 file(s), 2 failed".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_paths_committed_once() {
        let vcs = Arc::new(MockVcs::new());
        let (committer, _reporter) = committer(&vcs);
        let batch = vec![
            ChangedFile::new("a.txt", " M"),
            ChangedFile::new("a.txt", " M"),
            ChangedFile::new("b.txt", " M"),
        ];

        let report = committer.commit_batch(&batch, 5).await;
        assert_eq!(report.committed, vec!["a.txt".to_string(), "b.txt".to_string()]);
        assert_eq!(vcs.count(|c| matches!(c, Call::Commit { .. })), 2);
    }

    #[tokio::test]
    async fn test_rename_stages_new_path_and_commits_both() {
        let vcs = Arc::new(MockVcs::new());
        let (committer, _reporter) = committer(&vcs);
        let renamed = ChangedFile {
            path: "new.txt".to_string(),
            status: "R ".to_string(),
            original_path: Some("old.txt".to_string()),
        };

        committer.commit_batch(&[renamed], 5).await;
        let calls = vcs.calls();
        assert_eq!(calls[0], Call::Stage(vec!["new.txt".to_string()]));
        assert!(matches!(
            &calls[1],
            Call::Commit { paths, .. } if *paths == vec!["new.txt".to_string(), "old.txt".to_string()]
        ));
    }

    proptest! {
        #[test]
        fn prop_commit_attempts_are_min_of_count_and_limit(n in 0usize..20, limit in 1usize..10) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let vcs = Arc::new(MockVcs::new());
            let (committer, _reporter) = committer(&vcs);

            let report = runtime.block_on(committer.commit_batch(&files(n), limit));

            prop_assert_eq!(report.committed.len(), n.min(limit));
            prop_assert_eq!(vcs.count(|c| matches!(c, Call::Commit { .. })), n.min(limit));
            prop_assert_eq!(vcs.count(|c| matches!(c, Call::Stage(_))), n.min(limit));
        }
    }
}
