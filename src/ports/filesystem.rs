//! Filesystem port for every read, walk, copy and delete the pipeline makes.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// What a path is, read without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symbolic link, never followed.
    Symlink,
    /// Socket, FIFO or device node.
    Other,
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Its kind.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Final path component, lossily decoded.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

/// One item produced by [`FileSystem::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkItem {
    /// A readable entry.
    Entry(DirEntry),
    /// A path below the walk root that could not be read.
    Unreadable {
        /// The offending path.
        path: PathBuf,
        /// OS error text.
        reason: String,
    },
}

/// Decides whether the walk leaves out an entry (and, for a directory,
/// everything beneath it).
pub type SkipEntry<'a> = &'a dyn Fn(&DirEntry) -> bool;

/// Provides filesystem access for the repository, the destination and the
/// tool's own artifacts.
///
/// Abstracting the filesystem keeps copy and prune testable against an
/// in-memory tree.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Reads the raw bytes of a file.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the file cannot be read.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Writes `contents` to `path`, creating parent directories.
    ///
    /// The write is all-or-nothing: readers observe either the previous file
    /// or the complete new one.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the write or the final rename fails.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Kind of `path` without following a final symlink; `None` when absent.
    fn entry_kind(&self, path: &Path) -> Option<EntryKind>;

    /// Entries directly inside `path`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the path is not a readable directory.
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Every entry below `root` in sorted pre-order, never following
    /// symlinks. `root` itself is not yielded. Entries for which `skip`
    /// returns `true` are left out, and skipped directories are not entered.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if `root` itself cannot be read; failures below
    /// it become [`WalkItem::Unreadable`].
    fn walk(&self, root: &Path, skip: SkipEntry<'_>) -> Result<Vec<WalkItem>>;

    /// Copies a file's bytes from `from` to `to`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the source cannot be read or the copy fails.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Removes a file or a symlink.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the removal fails.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Removes an empty directory.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the directory is not empty or cannot be removed.
    fn remove_dir(&self, path: &Path) -> Result<()>;

    /// Removes a directory and everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if any removal fails.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}
