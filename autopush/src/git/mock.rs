//! Scripted `Vcs` for unit tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::{BranchSet, ChangedFile, PullMode, PushTarget, Vcs, VcsError};

/// A recorded call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    IsRepository,
    Status,
    Stage(Vec<String>),
    Commit { message: String, paths: Vec<String> },
    Push(PushTarget),
    Pull { remote: String, branch: String, mode: PullMode },
    Remotes,
    AddRemote { name: String, url: String },
    Branches,
    Checkout(String),
    CurrentBranch,
}

struct MockState {
    calls: Vec<Call>,
    is_repository: bool,
    statuses: VecDeque<Result<Vec<ChangedFile>, String>>,
    committed: HashSet<String>,
    push_results: VecDeque<Result<(), String>>,
    pull_results: VecDeque<Result<(), String>>,
    remotes: Vec<String>,
    add_remote_error: Option<String>,
    branches: Vec<String>,
    current: String,
    branches_error: Option<String>,
    current_branch_error: Option<String>,
    checkout_error: Option<String>,
    stage_errors: HashMap<String, String>,
    commit_errors: HashMap<String, String>,
}

/// Mock VCS with scripted responses and a call log
///
/// Status responses are consumed in order; the last one repeats. Push and
/// pull results are consumed in order and succeed once exhausted. Committed
/// paths disappear from later status responses.
pub struct MockVcs {
    state: Mutex<MockState>,
}

impl Default for MockVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVcs {
    pub fn new() -> Self {
        debug!("MockVcs::new: called");
        Self {
            state: Mutex::new(MockState {
                calls: Vec::new(),
                is_repository: true,
                statuses: VecDeque::new(),
                committed: HashSet::new(),
                push_results: VecDeque::new(),
                pull_results: VecDeque::new(),
                remotes: Vec::new(),
                add_remote_error: None,
                branches: vec!["main".to_string()],
                current: "main".to_string(),
                branches_error: None,
                current_branch_error: None,
                checkout_error: None,
                stage_errors: HashMap::new(),
                commit_errors: HashMap::new(),
            }),
        }
    }

    fn update(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn not_a_repository(self) -> Self {
        self.update(|s| s.is_repository = false)
    }

    pub fn with_status(self, files: Vec<ChangedFile>) -> Self {
        self.update(|s| s.statuses.push_back(Ok(files)))
    }

    pub fn with_status_error(self, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.update(|s| s.statuses.push_back(Err(stderr)))
    }

    /// Script push results: `Ok(())` succeeds, `Err(stderr)` fails with that output
    pub fn with_push_results(self, results: Vec<Result<(), &str>>) -> Self {
        self.update(|s| s.push_results.extend(results.into_iter().map(|r| r.map_err(String::from))))
    }

    pub fn with_pull_results(self, results: Vec<Result<(), &str>>) -> Self {
        self.update(|s| s.pull_results.extend(results.into_iter().map(|r| r.map_err(String::from))))
    }

    pub fn with_remotes(self, remotes: &[&str]) -> Self {
        let remotes = remotes.iter().map(|r| r.to_string()).collect();
        self.update(|s| s.remotes = remotes)
    }

    pub fn with_add_remote_error(self, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.update(|s| s.add_remote_error = Some(stderr))
    }

    pub fn with_branches(self, all: &[&str], current: &str) -> Self {
        let all = all.iter().map(|b| b.to_string()).collect();
        let current = current.to_string();
        self.update(|s| {
            s.branches = all;
            s.current = current;
        })
    }

    pub fn with_branches_error(self, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.update(|s| s.branches_error = Some(stderr))
    }

    pub fn with_current_branch_error(self, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.update(|s| s.current_branch_error = Some(stderr))
    }

    pub fn with_checkout_error(self, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.update(|s| s.checkout_error = Some(stderr))
    }

    pub fn with_stage_error(self, path: &str, stderr: &str) -> Self {
        let (path, stderr) = (path.to_string(), stderr.to_string());
        self.update(|s| {
            s.stage_errors.insert(path, stderr);
        })
    }

    pub fn with_commit_error(self, path: &str, stderr: &str) -> Self {
        let (path, stderr) = (path.to_string(), stderr.to_string());
        self.update(|s| {
            s.commit_errors.insert(path, stderr);
        })
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of recorded calls matching a predicate
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn current(&self) -> String {
        self.state.lock().unwrap().current.clone()
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, MockState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl Vcs for MockVcs {
    async fn is_repository(&self) -> Result<bool, VcsError> {
        Ok(self.record(Call::IsRepository).is_repository)
    }

    async fn status(&self) -> Result<Vec<ChangedFile>, VcsError> {
        let mut state = self.record(Call::Status);
        if !state.is_repository {
            return Err(VcsError::NotARepository("mock".to_string()));
        }

        let next = if state.statuses.len() > 1 {
            state.statuses.pop_front()
        } else {
            state.statuses.front().cloned()
        };

        match next {
            Some(Ok(files)) => Ok(files
                .into_iter()
                .filter(|f| !state.committed.contains(&f.path))
                .collect()),
            Some(Err(stderr)) => Err(VcsError::command_failed("status", stderr)),
            None => Ok(Vec::new()),
        }
    }

    async fn stage(&self, paths: &[String]) -> Result<(), VcsError> {
        let state = self.record(Call::Stage(paths.to_vec()));
        match paths.iter().find_map(|p| state.stage_errors.get(p)) {
            Some(stderr) => Err(VcsError::command_failed("add", stderr.clone())),
            None => Ok(()),
        }
    }

    async fn commit(&self, message: &str, paths: &[String]) -> Result<(), VcsError> {
        let mut state = self.record(Call::Commit {
            message: message.to_string(),
            paths: paths.to_vec(),
        });
        if let Some(stderr) = paths.iter().find_map(|p| state.commit_errors.get(p)) {
            return Err(VcsError::command_failed("commit", stderr.clone()));
        }
        state.committed.extend(paths.iter().cloned());
        Ok(())
    }

    async fn push(&self, target: &PushTarget) -> Result<(), VcsError> {
        let mut state = self.record(Call::Push(target.clone()));
        match state.push_results.pop_front() {
            Some(Err(stderr)) => Err(VcsError::command_failed("push", stderr)),
            _ => Ok(()),
        }
    }

    async fn pull(&self, remote: &str, branch: &str, mode: PullMode) -> Result<(), VcsError> {
        let mut state = self.record(Call::Pull {
            remote: remote.to_string(),
            branch: branch.to_string(),
            mode,
        });
        match state.pull_results.pop_front() {
            Some(Err(stderr)) => Err(VcsError::command_failed("pull", stderr)),
            _ => Ok(()),
        }
    }

    async fn remotes(&self) -> Result<Vec<String>, VcsError> {
        Ok(self.record(Call::Remotes).remotes.clone())
    }

    async fn add_remote(&self, name: &str, url: &str) -> Result<(), VcsError> {
        let mut state = self.record(Call::AddRemote {
            name: name.to_string(),
            url: url.to_string(),
        });
        if let Some(stderr) = state.add_remote_error.clone() {
            return Err(VcsError::command_failed("remote add", stderr));
        }
        state.remotes.push(name.to_string());
        Ok(())
    }

    async fn branches(&self) -> Result<BranchSet, VcsError> {
        let state = self.record(Call::Branches);
        if let Some(stderr) = &state.branches_error {
            return Err(VcsError::command_failed("branch", stderr.clone()));
        }
        Ok(BranchSet {
            all: state.branches.clone(),
            current: state.current.clone(),
        })
    }

    async fn checkout(&self, branch: &str) -> Result<(), VcsError> {
        let mut state = self.record(Call::Checkout(branch.to_string()));
        if let Some(stderr) = &state.checkout_error {
            return Err(VcsError::command_failed("checkout", stderr.clone()));
        }
        state.current = branch.to_string();
        Ok(())
    }

    async fn current_branch(&self) -> Result<String, VcsError> {
        let state = self.record(Call::CurrentBranch);
        match &state.current_branch_error {
            Some(stderr) => Err(VcsError::command_failed("symbolic-ref", stderr.clone())),
            None => Ok(state.current.clone()),
        }
    }
}
