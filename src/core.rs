use crate::{
    config::{ConfigStore, WorkflowConfig},
    errors::{RepoSyncError, Result},
    git::{RepoHandle, Vcs},
    sync::sync_contents,
};
use std::fmt;
use std::path::Path;

/// Which of the two clones an action is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Side {
    /// The first clone, copied from
    Source,
    /// The `_copy` clone, copied into and committed
    Target,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Source => "first",
            Side::Target => "second",
        }
    }
}

/// The user-triggered operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Clone,
    Checkout(Side),
    SyncContents,
    CreateBranch,
    CommitAndPush,
    PersistConfig,
}

impl Action {
    fn failure_headline(self) -> String {
        match self {
            Action::Clone => "Cloning the repository failed".to_string(),
            Action::Checkout(side) => {
                format!("Switching branch in the {} repository failed", side.label())
            }
            Action::SyncContents => "Copying the contents failed".to_string(),
            Action::CreateBranch => "Creating the new branch failed".to_string(),
            Action::CommitAndPush => "Committing the changes failed".to_string(),
            Action::PersistConfig => "Saving the field values failed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    /// Nothing went wrong but nothing was done either
    Info,
    Error,
}

/// The single message every action ends with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn failure(headline: &str, error: &RepoSyncError) -> Self {
        Self {
            level: Level::Error,
            message: format!("{} ({})\n{}", headline, error.kind(), error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.level {
            Level::Success => "✅",
            Level::Info => "ℹ️ ",
            Level::Error => "❌",
        };
        write!(f, "{} {}", icon, self.message)
    }
}

/// Everything the actions read and write: the fields and both clones
#[derive(Debug, Default)]
pub struct AppState {
    pub config: WorkflowConfig,
    pub source: Option<RepoHandle>,
    pub target: Option<RepoHandle>,
}

impl AppState {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            source: None,
            target: None,
        }
    }

    pub fn handle(&self, side: Side) -> Option<&RepoHandle> {
        match side {
            Side::Source => self.source.as_ref(),
            Side::Target => self.target.as_ref(),
        }
    }

    fn handle_mut(&mut self, side: Side) -> Option<&mut RepoHandle> {
        match side {
            Side::Source => self.source.as_mut(),
            Side::Target => self.target.as_mut(),
        }
    }

    /// Populate the handles from clones a previous run left on disk
    ///
    /// Directories that are missing or are not working copies leave the handle absent.
    pub fn attach_existing<V: Vcs>(&mut self, vcs: &V) {
        let directory = self.config.directory_name.trim();
        if directory.is_empty() {
            return;
        }

        let copy = copy_directory_name(directory);
        for (side, dir) in [(Side::Source, directory), (Side::Target, copy.as_str())] {
            let path = Path::new(dir);
            if !path.is_dir() {
                continue;
            }
            match vcs.open(path) {
                Ok(handle) => {
                    log::debug!("Using existing clone {} as the {} repository", dir, side.label());
                    match side {
                        Side::Source => self.source = Some(handle),
                        Side::Target => self.target = Some(handle),
                    }
                }
                Err(e) => log::debug!("{} is not a usable clone: {}", dir, e),
            }
        }
    }
}

/// Directory of the second clone
pub fn copy_directory_name(directory: &str) -> String {
    format!("{}_copy", directory)
}

pub fn branch_field(config: &WorkflowConfig, side: Side) -> &str {
    match side {
        Side::Source => &config.source_branch,
        Side::Target => &config.target_branch,
    }
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(RepoSyncError::Validation(format!("Please enter the {}", what)))
    } else {
        Ok(value)
    }
}

fn not_cloned(side: Side) -> RepoSyncError {
    RepoSyncError::Precondition(format!(
        "The {} repository is missing, clone first",
        side.label()
    ))
}

/// Clone the URL into the directory and into its `_copy` sibling
///
/// Nothing is rolled back: when the second clone fails the first one stays.
pub fn clone_repositories<V: Vcs>(vcs: &V, state: &mut AppState) -> Result<Notification> {
    let directory = state.config.directory_name.trim().to_string();
    let url = state.config.git_url.trim().to_string();
    if directory.is_empty() || url.is_empty() {
        return Err(RepoSyncError::Validation(
            "Please enter the directory name and the git URL".to_string(),
        ));
    }
    let copy = copy_directory_name(&directory);

    let source = vcs.clone_repo(&url, Path::new(&directory))?;
    state.source = Some(source);
    state.target = None;

    let target = vcs.clone_repo(&url, Path::new(&copy))?;
    state.target = Some(target);

    Ok(Notification::success(format!(
        "Repository cloned into two directories:\n1. {}\n2. {}",
        directory, copy
    )))
}

/// Switch one of the clones to the branch named in its field
pub fn checkout_branch<V: Vcs>(vcs: &V, state: &mut AppState, side: Side) -> Result<Notification> {
    let what = format!("branch name of the {} repository", side.label());
    let branch = required(branch_field(&state.config, side), &what)?.to_string();
    let handle = state.handle_mut(side).ok_or_else(|| not_cloned(side))?;

    vcs.checkout(handle, &branch)?;
    handle.branch = Some(branch.clone());

    Ok(Notification::success(format!(
        "The {} repository is now on branch {}",
        side.label(),
        branch
    )))
}

/// Copy the first clone's working tree over the second one
pub fn sync_working_trees(state: &AppState) -> Result<Notification> {
    let (source, target) = match (&state.source, &state.target) {
        (Some(source), Some(target)) => (source, target),
        (None, _) => return Err(not_cloned(Side::Source)),
        (_, None) => return Err(not_cloned(Side::Target)),
    };

    for handle in [source, target] {
        if !handle.path.is_dir() {
            return Err(RepoSyncError::Precondition(format!(
                "Cannot find the working directory {}",
                handle.path.display()
            )));
        }
    }

    let source_root = source.path.canonicalize()?;
    if target.path.canonicalize()?.starts_with(&source_root) {
        return Err(RepoSyncError::Precondition(format!(
            "The second repository {} lies inside the first one {}",
            target.path.display(),
            source.path.display()
        )));
    }

    let report = sync_contents(&source.path, &target.path)?;

    Ok(Notification::success(format!(
        "Copied {} files and {} directories from {} over {}",
        report.files,
        report.directories,
        source.path.display(),
        target.path.display()
    )))
}

/// Create the new branch in the second clone and switch to it
pub fn create_branch<V: Vcs>(vcs: &V, state: &mut AppState) -> Result<Notification> {
    let name = required(&state.config.new_branch, "new branch name")?.to_string();
    let target = state
        .target
        .as_mut()
        .ok_or_else(|| not_cloned(Side::Target))?;

    vcs.create_and_checkout_branch(target, &name)?;
    target.branch = Some(name.clone());

    Ok(Notification::success(format!(
        "Created and switched to branch {} in the second repository",
        name
    )))
}

/// Stage, commit and push everything in the second clone, if anything changed
pub fn commit_and_push<V: Vcs>(vcs: &V, state: &AppState) -> Result<Notification> {
    let message = required(&state.config.commit_message, "commit message")?;
    let target = state.target.as_ref().ok_or_else(|| not_cloned(Side::Target))?;

    if !vcs.is_dirty(target)? {
        return Ok(Notification::info("There are no uncommitted changes"));
    }

    vcs.stage_all(target)?;
    vcs.commit(target, message)?;
    vcs.push(target)?;

    Ok(Notification::success(match &target.branch {
        Some(branch) => format!("Changes committed and pushed on branch {}", branch),
        None => "Changes committed and pushed".to_string(),
    }))
}

pub fn persist_config(store: &ConfigStore, state: &AppState) -> Result<Notification> {
    store.save(&state.config)?;
    Ok(Notification::success(format!(
        "Field values saved to {}",
        store.path().display()
    )))
}

/// Run one action and turn its outcome into a notification
pub fn perform<V: Vcs>(
    action: Action,
    vcs: &V,
    store: &ConfigStore,
    state: &mut AppState,
) -> Notification {
    log::debug!("Running {:?}", action);

    let result = match action {
        Action::Clone => clone_repositories(vcs, state),
        Action::Checkout(side) => checkout_branch(vcs, state, side),
        Action::SyncContents => sync_working_trees(state),
        Action::CreateBranch => create_branch(vcs, state),
        Action::CommitAndPush => commit_and_push(vcs, state),
        Action::PersistConfig => persist_config(store, state),
    };

    result.unwrap_or_else(|e| Notification::failure(&action.failure_headline(), &e))
}

/// The whole workflow in its usual order, checkouts with an empty branch field skipped
pub fn run_steps(config: &WorkflowConfig) -> Vec<Action> {
    let mut steps = vec![Action::Clone];
    for side in [Side::Source, Side::Target] {
        if !branch_field(config, side).trim().is_empty() {
            steps.push(Action::Checkout(side));
        }
    }
    steps.extend([
        Action::SyncContents,
        Action::CreateBranch,
        Action::CommitAndPush,
    ]);
    steps
}

/// Perform [`run_steps`] one by one, stopping at the first error
///
/// Returns whether every step succeeded.
pub fn run_all<V: Vcs>(
    vcs: &V,
    store: &ConfigStore,
    state: &mut AppState,
    mut report: impl FnMut(&Notification),
) -> bool {
    for action in run_steps(&state.config) {
        let notification = perform(action, vcs, store, state);
        report(&notification);
        if notification.is_error() {
            return false;
        }
    }
    true
}
