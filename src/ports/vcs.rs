//! Version-control port.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// The two version-control primitives a snapshot needs.
pub trait VcsRepo: Send + Sync {
    /// Returns the absolute path of the repository's top-level directory.
    ///
    /// # Errors
    ///
    /// Returns a `Vcs` error if the tool fails or the cwd is not in a repository.
    fn repo_root(&self) -> Result<PathBuf>;

    /// Returns the HEAD commit hash of the repository at `root`.
    ///
    /// # Errors
    ///
    /// Returns a `Vcs` error if the tool fails or the working tree is dirty.
    fn commit_hash(&self, root: &Path) -> Result<String>;
}
