//! Error taxonomy shared by every pipeline stage.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal failures. Recoverable problems are collected as
/// [`Warning`](crate::report::Warning)s instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad user input: unknown target folder, conflicting flags, missing artifacts.
    #[error("{0}")]
    Validation(String),

    /// The version-control tool failed or refused the working tree.
    #[error("vcs error running `{command}`: {message}")]
    Vcs {
        /// Command line that was invoked.
        command: String,
        /// Captured stderr or a description of the refusal.
        message: String,
    },

    /// The package description tool exited non-zero or could not be spawned.
    #[error("manifest tool `{command}` failed in {}: {stderr}", .directory.display())]
    ManifestTool {
        /// Command line that was invoked.
        command: String,
        /// Package root the tool ran in.
        directory: PathBuf,
        /// Captured stderr.
        stderr: String,
    },

    /// Filesystem failure on a path the current stage cannot do without.
    #[error("io error at {}: {source}", .path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON/YAML from a collaborator or a persisted artifact.
    #[error("failed to parse {context}: {message}")]
    Parse {
        /// What was being parsed.
        context: String,
        /// Parser message.
        message: String,
    },
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }

    /// Builds a parse error from anything displayable.
    pub fn parse(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Parse { context: context.into(), message: message.to_string() }
    }

    /// Builds a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
