use crate::errors::{RepoSyncError, Result};
use crate::git::RepoHandle;
use auth_git2::GitAuthenticator;
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    Branch, BranchType, ErrorCode, FetchOptions, IndexAddOption, ObjectType, PushOptions,
    RemoteCallbacks, Repository, StatusOptions,
};
use std::path::Path;

/// The version-control operations the workflow needs
pub trait Vcs {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<RepoHandle>;
    /// Pick up a working copy that already exists on disk
    fn open(&self, path: &Path) -> Result<RepoHandle>;
    fn checkout(&self, repo: &RepoHandle, branch: &str) -> Result<()>;
    fn create_and_checkout_branch(&self, repo: &RepoHandle, name: &str) -> Result<()>;
    fn is_dirty(&self, repo: &RepoHandle) -> Result<bool>;
    fn stage_all(&self, repo: &RepoHandle) -> Result<()>;
    fn commit(&self, repo: &RepoHandle, message: &str) -> Result<()>;
    fn push(&self, repo: &RepoHandle) -> Result<()>;
}

/// [`Vcs`] on top of libgit2
#[derive(Debug, Default)]
pub struct GitVcs;

impl GitVcs {
    pub fn new() -> Self {
        Self
    }

    fn open_repo(&self, handle: &RepoHandle) -> Result<Repository> {
        Ok(Repository::open(&handle.path)?)
    }
}

fn handle_for(repo: &Repository, remote_url: String) -> Result<RepoHandle> {
    let path = repo
        .workdir()
        .ok_or_else(|| RepoSyncError::VcsCommand("bare repositories are not supported".to_string()))?
        .to_path_buf();

    Ok(RepoHandle {
        path,
        remote_url,
        branch: current_branch(repo)?,
    })
}

fn current_branch(repo: &Repository) -> Result<Option<String>> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if head.is_branch() {
        Ok(head.shorthand().map(|s| s.to_string()))
    } else {
        Ok(None)
    }
}

fn origin_url(repo: &Repository) -> Result<String> {
    if let Ok(remote) = repo.find_remote("origin") {
        if let Some(url) = remote.url() {
            return Ok(url.to_string());
        }
    }

    for name in repo.remotes()?.iter().flatten() {
        if let Some(url) = repo.find_remote(name).ok().and_then(|r| r.url().map(String::from)) {
            return Ok(url);
        }
    }

    Ok(String::new())
}

/// Resolve `name` the way `git checkout <name>` does
///
/// A local branch wins. Otherwise a single remote-tracking branch with that
/// name becomes a new local branch tracking it.
fn local_or_tracking_branch<'r>(repo: &'r Repository, name: &str) -> Result<Branch<'r>> {
    match repo.find_branch(name, BranchType::Local) {
        Ok(branch) => return Ok(branch),
        Err(e) if e.code() != ErrorCode::NotFound => return Err(e.into()),
        Err(_) => {}
    }

    let candidates: Vec<String> = repo
        .remotes()?
        .iter()
        .flatten()
        .map(|remote| format!("{}/{}", remote, name))
        .filter(|candidate| repo.find_branch(candidate, BranchType::Remote).is_ok())
        .collect();

    let tracked = match candidates.as_slice() {
        [tracked] => tracked,
        [] => {
            return Err(RepoSyncError::VcsCommand(format!(
                "pathspec '{}' did not match any file(s) known to git",
                name
            )))
        }
        _ => {
            return Err(RepoSyncError::VcsCommand(format!(
                "'{}' matched multiple ({}) remote tracking branches",
                name,
                candidates.len()
            )))
        }
    };

    let commit = repo
        .find_branch(tracked, BranchType::Remote)?
        .get()
        .peel_to_commit()?;
    let mut branch = repo.branch(name, &commit, false)?;
    branch.set_upstream(Some(tracked.as_str()))?;
    log::info!("Branch '{}' set up to track '{}'", name, tracked);

    Ok(branch)
}

/// `branch.<branch>.<key>` from a config snapshot, `None` when unset
fn branch_setting(config: &git2::Config, branch: &str, key: &str) -> Result<Option<String>> {
    match config.get_string(&format!("branch.{}.{}", branch, key)) {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Vcs for GitVcs {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<RepoHandle> {
        log::info!("Cloning {} into {}", url, dest.display());

        let config = git2::Config::open_default()?;
        let authenticator = GitAuthenticator::default();
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(authenticator.credentials(&config));

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let repo = RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, dest)?;

        handle_for(&repo, url.to_string())
    }

    fn open(&self, path: &Path) -> Result<RepoHandle> {
        let repo = Repository::open(path)?;
        let url = origin_url(&repo)?;
        handle_for(&repo, url)
    }

    fn checkout(&self, handle: &RepoHandle, branch: &str) -> Result<()> {
        let repo = self.open_repo(handle)?;
        let reference = local_or_tracking_branch(&repo, branch)?.into_reference();
        let refname = reference
            .name()
            .ok_or_else(|| RepoSyncError::VcsCommand(format!("invalid reference name for '{}'", branch)))?
            .to_string();
        let target = reference.peel(ObjectType::Commit)?;

        log::debug!("Checking out {} in {}", refname, handle.path.display());
        repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        repo.set_head(&refname)?;
        Ok(())
    }

    fn create_and_checkout_branch(&self, handle: &RepoHandle, name: &str) -> Result<()> {
        let repo = self.open_repo(handle)?;
        let head = repo.head()?.peel_to_commit()?;

        // Same commit as HEAD, so only HEAD has to move
        let branch = repo.branch(name, &head, false)?;
        let refname = branch
            .get()
            .name()
            .ok_or_else(|| RepoSyncError::VcsCommand(format!("invalid reference name for '{}'", name)))?
            .to_string();
        repo.set_head(&refname)?;

        log::info!("Switched {} to new branch '{}'", handle.path.display(), name);
        Ok(())
    }

    fn is_dirty(&self, handle: &RepoHandle) -> Result<bool> {
        let repo = self.open_repo(handle)?;
        let mut options = StatusOptions::new();
        options.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    fn stage_all(&self, handle: &RepoHandle) -> Result<()> {
        let repo = self.open_repo(handle)?;
        let mut index = repo.index()?;
        // add_all picks up new and modified files, update_all the deleted ones
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, handle: &RepoHandle, message: &str) -> Result<()> {
        let repo = self.open_repo(handle)?;
        let mut index = repo.index()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let signature = repo.signature()?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<_> = parent.iter().collect();

        let id = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        log::info!("Committed {} in {}", id, handle.path.display());
        Ok(())
    }

    fn push(&self, handle: &RepoHandle) -> Result<()> {
        let repo = self.open_repo(handle)?;
        let branch = match current_branch(&repo)? {
            Some(branch) => branch,
            None => {
                return Err(RepoSyncError::VcsCommand(
                    "HEAD is not on a branch, nothing to push".to_string(),
                ))
            }
        };

        let local_ref = format!("refs/heads/{}", branch);
        let mut config = repo.config()?;
        let settings = config.snapshot()?;
        let remote_name = branch_setting(&settings, &branch, "remote")?
            .unwrap_or_else(|| "origin".to_string());
        let remote_ref =
            branch_setting(&settings, &branch, "merge")?.unwrap_or_else(|| local_ref.clone());
        let refspec = format!("{}:{}", local_ref, remote_ref);

        let mut remote = repo.find_remote(&remote_name)?;
        let authenticator = GitAuthenticator::default();
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(authenticator.credentials(&config));
        // The remote may refuse a ref without failing the whole push
        callbacks.push_update_reference(|refname, status| match status {
            Some(reason) => Err(git2::Error::from_str(&format!(
                "failed to push {}: {}",
                refname, reason
            ))),
            None => Ok(()),
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        log::info!("Pushing {} to {}", refspec, remote_name);
        remote.push(&[refspec.as_str()], Some(&mut options))?;
        Ok(())
    }
}
