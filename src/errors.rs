use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoSyncError {
    /// A required field was left empty
    #[error("{0}")]
    Validation(String),

    /// The operation needs a step that has not happened yet (usually a clone)
    #[error("{0}")]
    Precondition(String),

    /// The git layer reported a failure, message passed through as is
    #[error("{0}")]
    VcsCommand(String),

    #[error("{0}")]
    Filesystem(#[from] std::io::Error),

    #[error("{0}")]
    Unknown(String),
}

impl From<git2::Error> for RepoSyncError {
    fn from(error: git2::Error) -> Self {
        RepoSyncError::VcsCommand(error.message().to_string())
    }
}

impl From<serde_json::Error> for RepoSyncError {
    fn from(error: serde_json::Error) -> Self {
        RepoSyncError::Unknown(error.to_string())
    }
}

impl RepoSyncError {
    /// Short name of the error kind, shown in front of error notifications
    pub fn kind(&self) -> &'static str {
        match self {
            RepoSyncError::Validation(_) => "missing input",
            RepoSyncError::Precondition(_) => "not ready",
            RepoSyncError::VcsCommand(_) => "git",
            RepoSyncError::Filesystem(_) => "filesystem",
            RepoSyncError::Unknown(_) => "unexpected",
        }
    }
}

pub type Result<T> = std::result::Result<T, RepoSyncError>;
