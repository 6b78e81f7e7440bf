pub mod types;
pub mod vcs;

#[cfg(test)]
pub mod mock;

pub use types::RepoHandle;
pub use vcs::{GitVcs, Vcs};
