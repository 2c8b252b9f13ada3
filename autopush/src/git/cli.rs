//! `Vcs` implementation backed by the git command line

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{BranchSet, ChangedFile, PullMode, PushTarget, Vcs, VcsError};

/// Git session bound to one working directory
pub struct GitCli {
    work_dir: PathBuf,
}

impl GitCli {
    /// Create a session for the given working directory
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        debug!(?work_dir, "GitCli::new: called");
        Self { work_dir }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Run git with the given arguments and return raw stdout
    async fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        debug!(?args, "GitCli::run: called");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // commit and merge report some failures on stdout
            let text = if stdout.trim().is_empty() {
                stderr.trim().to_string()
            } else {
                format!("{}\n{}", stderr.trim(), stdout.trim()).trim().to_string()
            };
            debug!(?args, %text, "GitCli::run: command failed");
            return Err(VcsError::command_failed(args.join(" "), text));
        }

        debug!(?args, "GitCli::run: command succeeded");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run git and collect non-empty trimmed output lines
    async fn run_lines(&self, args: &[&str]) -> Result<Vec<String>, VcsError> {
        let stdout = self.run(args).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn is_repository(&self) -> Result<bool, VcsError> {
        debug!("GitCli::is_repository: called");
        match self.run(&["rev-parse", "--is-inside-work-tree"]).await {
            Ok(stdout) => Ok(stdout.trim() == "true"),
            Err(VcsError::NotARepository(_)) => {
                debug!("GitCli::is_repository: not a repository");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn status(&self) -> Result<Vec<ChangedFile>, VcsError> {
        debug!("GitCli::status: called");
        let stdout = self
            .run(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])
            .await?;
        let files = parse_porcelain(&stdout);
        debug!(count = files.len(), "GitCli::status: parsed entries");
        Ok(files)
    }

    async fn stage(&self, paths: &[String]) -> Result<(), VcsError> {
        debug!(?paths, "GitCli::stage: called");
        let mut args = vec!["add", "-A", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn commit(&self, message: &str, paths: &[String]) -> Result<(), VcsError> {
        debug!(%message, ?paths, "GitCli::commit: called");
        let mut args = vec!["commit", "-m", message, "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args).await?;
        Ok(())
    }

    async fn push(&self, target: &PushTarget) -> Result<(), VcsError> {
        debug!(?target, "GitCli::push: called");
        match target {
            PushTarget::Upstream => self.run(&["push"]).await?,
            PushTarget::SetUpstream { remote, branch } => {
                self.run(&["push", remote.as_str(), branch.as_str(), "-u"]).await?
            }
        };
        Ok(())
    }

    async fn pull(&self, remote: &str, branch: &str, mode: PullMode) -> Result<(), VcsError> {
        debug!(%remote, %branch, ?mode, "GitCli::pull: called");
        match mode {
            PullMode::MergeUnrelated => {
                self.run(&[
                    "pull",
                    "--no-rebase",
                    "--no-edit",
                    "--allow-unrelated-histories",
                    remote,
                    branch,
                ])
                .await?
            }
            // Uncommitted leftovers from a partial batch would otherwise block the rebase
            PullMode::Rebase => {
                self.run(&["pull", "--rebase", "--autostash", remote, branch]).await?
            }
        };
        Ok(())
    }

    async fn remotes(&self) -> Result<Vec<String>, VcsError> {
        debug!("GitCli::remotes: called");
        self.run_lines(&["remote"]).await
    }

    async fn add_remote(&self, name: &str, url: &str) -> Result<(), VcsError> {
        debug!(%name, %url, "GitCli::add_remote: called");
        self.run(&["remote", "add", name, url]).await?;
        Ok(())
    }

    async fn branches(&self) -> Result<BranchSet, VcsError> {
        debug!("GitCli::branches: called");
        let mut all = self.run_lines(&["branch", "--format=%(refname:short)"]).await?;
        let current = self.current_branch().await?;

        // An unborn branch has no ref yet
        if !all.contains(&current) {
            debug!(%current, "GitCli::branches: current branch has no commits");
            all.push(current.clone());
        }

        Ok(BranchSet { all, current })
    }

    async fn checkout(&self, branch: &str) -> Result<(), VcsError> {
        debug!(%branch, "GitCli::checkout: called");
        self.run(&["checkout", branch, "--"]).await?;
        Ok(())
    }

    async fn current_branch(&self) -> Result<String, VcsError> {
        debug!("GitCli::current_branch: called");
        let stdout = self.run(&["symbolic-ref", "--short", "HEAD"]).await?;
        Ok(stdout.trim().to_string())
    }
}

/// Parse `git status --porcelain=v1 -z` output
///
/// Entries are NUL-terminated `XY PATH`. Renames and copies are followed by a
/// second NUL-terminated field holding the original path.
pub fn parse_porcelain(output: &str) -> Vec<ChangedFile> {
    let mut files = Vec::new();
    let mut fields = output.split('\0').filter(|field| !field.is_empty());

    while let Some(entry) = fields.next() {
        if entry.len() < 4 || !entry.is_char_boundary(2) || !entry.is_char_boundary(3) {
            debug!(%entry, "parse_porcelain: skipping malformed entry");
            continue;
        }

        let status = &entry[..2];
        let path = &entry[3..];
        let original_path = if status.contains(['R', 'C']) {
            fields.next().map(String::from)
        } else {
            None
        };

        files.push(ChangedFile {
            path: path.to_string(),
            status: status.to_string(),
            original_path,
        });
    }

    files
}
