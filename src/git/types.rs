use std::path::PathBuf;

/// A cloned working copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    /// Root of the working tree
    pub path: PathBuf,
    /// URL the clone was made from
    pub remote_url: String,
    /// Checked out branch, `None` on a detached or unborn HEAD
    pub branch: Option<String>,
}
