//! Working tree status

use std::sync::Arc;

use tracing::debug;

use crate::git::{ChangedFile, Vcs, VcsError};

/// Reads the list of changed paths from the repository
#[derive(Clone)]
pub struct StatusReader {
    vcs: Arc<dyn Vcs>,
}

impl StatusReader {
    pub fn new(vcs: Arc<dyn Vcs>) -> Self {
        Self { vcs }
    }

    /// Changed paths in the working tree
    ///
    /// Fails with [`VcsError::NotARepository`] outside a repository. Callers in
    /// the polling loop treat any failure as "try again later".
    pub async fn read_status(&self) -> Result<Vec<ChangedFile>, VcsError> {
        debug!("StatusReader::read_status: called");
        if !self.vcs.is_repository().await? {
            debug!("StatusReader::read_status: not a repository");
            return Err(VcsError::NotARepository(
                "working directory is not inside a git repository".to_string(),
            ));
        }

        let files = self.vcs.status().await?;
        debug!(count = files.len(), "StatusReader::read_status: returning files");
        Ok(files)
    }
}
