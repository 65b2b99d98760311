//! Repository snapshot: classified inventory plus per-target import closures.
//!
//! ```text
//! repo tree ──> scanner ──> RepoFile set + package manifests + project descriptors
//!                  │
//!                  ├──> manifest resolver ──> ModuleFileSet (product/module -> files)
//!                  ├──> project membership ──> compiled file set (optional)
//!                  └──> import index ──> file -> imported module names
//!                                   │
//!                          closure resolver ──> TargetSnapshot per target
//! ```

pub mod classify;
pub mod closure;
pub mod generator;
pub mod imports;
pub mod manifest;
pub mod project;
pub mod scanner;

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ports::{EntryKind, FileSystem};

/// Who a file belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "camelCase")]
pub enum Owner {
    /// Loose repository code outside every package root.
    Repo,
    /// Code inside the root of the named package.
    Package(String),
}

/// What role a file plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    /// Compiled source.
    Source,
    /// Test source; never part of a closure.
    Test,
    /// Bundled asset or data file.
    Resource,
    /// Anything else. Recorded but never flattened.
    Other,
}

/// One classified file, identified by its standardized repo-relative path.
///
/// Equality, hashing and ordering use the path only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFile {
    path: String,
    owner: Owner,
    kind: FileKind,
}

impl RepoFile {
    /// Creates a record; `path` is standardized first.
    #[must_use]
    pub fn new(path: &str, owner: Owner, kind: FileKind) -> Self {
        Self { path: standardize(path), owner, kind }
    }

    /// Repo-relative path with `/` separators.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Owning package or the repo.
    #[must_use]
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Classification.
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// `true` for repo-owned `Source` files.
    #[must_use]
    pub fn is_repo_source(&self) -> bool {
        self.owner == Owner::Repo && self.kind == FileKind::Source
    }
}

impl PartialEq for RepoFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for RepoFile {}

impl Hash for RepoFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for RepoFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RepoFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

/// A discovered package: its name and the repo-relative directory of its manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Package name.
    pub name: String,
    /// Manifest directory; empty for a manifest at the repository root.
    pub root_path: String,
}

/// A user-declared build target and the folder that seeds its closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    /// Target name; also the first component of its flattened paths.
    pub name: String,
    /// Repo-relative entry folder; empty means the whole repository.
    pub entry_folder: String,
}

impl TargetSpec {
    /// Parses `name[=folder]`; the folder defaults to the name.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for an empty name.
    pub fn parse(arg: &str) -> Result<Self> {
        let (name, folder) = match arg.split_once('=') {
            Some((name, folder)) => (name.trim(), folder.trim()),
            None => (arg.trim(), arg.trim()),
        };
        if name.is_empty() {
            return Err(Error::validation(format!("target `{arg}` has an empty name")));
        }
        Ok(Self { name: name.to_string(), entry_folder: standardize(folder) })
    }

    /// Checks the name and that the entry folder is a directory under `repo_root`.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error describing the problem.
    pub fn validate(&self, fs: &dyn FileSystem, repo_root: &Path) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("target name must not be empty"));
        }
        if !is_single_component(&self.name) {
            return Err(Error::validation(format!(
                "target name `{}` must be a single path component",
                self.name
            )));
        }
        let folder = standardize(&self.entry_folder);
        if folder.starts_with("..") {
            return Err(Error::validation(format!(
                "target {} entry folder `{}` is outside the repository",
                self.name, self.entry_folder
            )));
        }
        if fs.entry_kind(&repo_root.join(&folder)) != Some(EntryKind::Dir) {
            return Err(Error::validation(format!(
                "target {} entry folder `{}` does not exist or is not a directory",
                self.name, self.entry_folder
            )));
        }
        Ok(())
    }
}

/// The resolved closure of one target, sorted by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSnapshot {
    /// Target name.
    pub name: String,
    /// Closure files in lexicographic path order.
    pub files: Vec<RepoFile>,
}

/// Everything `snapshot` persists; input to the flatten planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotModel {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// HEAD commit the snapshot describes.
    pub commit_hash: String,
    /// Absolute repository root.
    pub repo_root: String,
    /// Packages sorted by name.
    pub packages: Vec<PackageManifest>,
    /// Targets sorted by name.
    pub targets: Vec<TargetSnapshot>,
}

/// Lexically standardizes a relative path: `/` separators, no empty or `.`
/// components, `..` folded where possible. Leading `..` components are kept.
#[must_use]
pub fn standardize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Joins two standardized relative paths.
#[must_use]
pub fn join_rel(base: &str, rest: &str) -> String {
    if base.is_empty() {
        standardize(rest)
    } else {
        standardize(&format!("{base}/{rest}"))
    }
}

/// `true` when `name` can stand as one directory name: not empty, not `.`
/// or `..`, and free of separators.
#[must_use]
pub fn is_single_component(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains(['/', '\\', '\0'])
}

/// `true` when `path` equals `prefix` or lies beneath it. An empty prefix matches everything.
#[must_use]
pub fn is_under(path: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'/')
}
