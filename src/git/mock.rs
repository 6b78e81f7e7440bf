use crate::errors::{RepoSyncError, Result};
use crate::git::{RepoHandle, Vcs};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Every call the workflow made, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Clone { url: String, dest: PathBuf },
    Open(PathBuf),
    Checkout { path: PathBuf, branch: String },
    CreateBranch { path: PathBuf, name: String },
    IsDirty(PathBuf),
    StageAll(PathBuf),
    Commit { path: PathBuf, message: String },
    Push(PathBuf),
}

pub struct MockVcs {
    pub dirty: bool,
    pub branches: HashSet<String>,
    pub failing_clones: HashSet<PathBuf>,
    pub failing_push: Option<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self {
            dirty: false,
            branches: HashSet::from(["main".to_string()]),
            failing_clones: HashSet::new(),
            failing_push: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_dirty(mut self, dirty: bool) -> Self {
        self.dirty = dirty;
        self
    }

    pub fn with_branches(mut self, branches: Vec<&str>) -> Self {
        self.branches.extend(branches.into_iter().map(String::from));
        self
    }

    pub fn with_failing_clone(mut self, dest: impl Into<PathBuf>) -> Self {
        self.failing_clones.insert(dest.into());
        self
    }

    pub fn with_failing_push(mut self, reason: &str) -> Self {
        self.failing_push = Some(reason.to_string());
        self
    }

    pub fn get_calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Vcs for MockVcs {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<RepoHandle> {
        self.record(Call::Clone {
            url: url.to_string(),
            dest: dest.to_path_buf(),
        });

        if self.failing_clones.contains(dest) {
            return Err(RepoSyncError::VcsCommand(format!(
                "'{}' exists and is not an empty directory",
                dest.display()
            )));
        }

        Ok(RepoHandle {
            path: dest.to_path_buf(),
            remote_url: url.to_string(),
            branch: Some("main".to_string()),
        })
    }

    fn open(&self, path: &Path) -> Result<RepoHandle> {
        self.record(Call::Open(path.to_path_buf()));
        Err(RepoSyncError::VcsCommand(format!(
            "could not find repository at '{}'",
            path.display()
        )))
    }

    fn checkout(&self, repo: &RepoHandle, branch: &str) -> Result<()> {
        self.record(Call::Checkout {
            path: repo.path.clone(),
            branch: branch.to_string(),
        });

        if self.branches.contains(branch) {
            Ok(())
        } else {
            Err(RepoSyncError::VcsCommand(format!(
                "pathspec '{}' did not match any file(s) known to git",
                branch
            )))
        }
    }

    fn create_and_checkout_branch(&self, repo: &RepoHandle, name: &str) -> Result<()> {
        self.record(Call::CreateBranch {
            path: repo.path.clone(),
            name: name.to_string(),
        });

        if self.branches.contains(name) {
            Err(RepoSyncError::VcsCommand(format!(
                "a branch named '{}' already exists",
                name
            )))
        } else {
            Ok(())
        }
    }

    fn is_dirty(&self, repo: &RepoHandle) -> Result<bool> {
        self.record(Call::IsDirty(repo.path.clone()));
        Ok(self.dirty)
    }

    fn stage_all(&self, repo: &RepoHandle) -> Result<()> {
        self.record(Call::StageAll(repo.path.clone()));
        Ok(())
    }

    fn commit(&self, repo: &RepoHandle, message: &str) -> Result<()> {
        self.record(Call::Commit {
            path: repo.path.clone(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn push(&self, repo: &RepoHandle) -> Result<()> {
        self.record(Call::Push(repo.path.clone()));
        match &self.failing_push {
            Some(reason) => Err(RepoSyncError::VcsCommand(reason.clone())),
            None => Ok(()),
        }
    }
}
