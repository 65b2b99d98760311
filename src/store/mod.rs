//! Artifact store: persistence for snapshots and flatten maps.
//!
//! Everything lives in the control directory at the repository root and goes
//! through the `FileSystem` port. Directory layout:
//!
//! ```text
//! <repo>/.repoflat/
//!   ├── config.yaml
//!   ├── snapshot.json
//!   ├── flatten.map.json
//!   └── cache/manifests/
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::ServiceContext;
use crate::error::{Error, Result};
use crate::flatten::FlattenMap;
use crate::snapshot::classify::CONTROL_DIR;
use crate::snapshot::SnapshotModel;

/// Snapshot artifact file name.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Flatten map artifact file name.
pub const FLATTEN_MAP_FILE: &str = "flatten.map.json";

/// Persistence layer for pipeline artifacts.
///
/// All I/O goes through `ctx.fs`; every write replaces the previous artifact
/// atomically.
pub struct ArtifactStore<'a> {
    ctx: &'a ServiceContext,
    root: PathBuf,
}

impl<'a> ArtifactStore<'a> {
    /// Creates a store for the repository at `repo_root`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, repo_root: &Path) -> Self {
        Self { ctx, root: repo_root.join(CONTROL_DIR) }
    }

    /// The control directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of cached package descriptions.
    #[must_use]
    pub fn manifest_cache_dir(&self) -> PathBuf {
        self.root.join("cache").join("manifests")
    }

    /// Path of the snapshot artifact.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    /// Path of the flatten map artifact.
    #[must_use]
    pub fn flatten_map_path(&self) -> PathBuf {
        self.root.join(FLATTEN_MAP_FILE)
    }

    /// Saves the snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_snapshot(&self, snapshot: &SnapshotModel) -> Result<()> {
        self.save_json(&self.snapshot_path(), snapshot, "snapshot")
    }

    /// Loads the snapshot.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if no snapshot has been taken, or a
    /// `Parse` error if it is unreadable.
    pub fn load_snapshot(&self) -> Result<SnapshotModel> {
        self.load_json(&self.snapshot_path(), "snapshot", "run `repoflat snapshot` first")
    }

    /// Saves the flatten map, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_flatten_map(&self, map: &FlattenMap) -> Result<()> {
        self.save_json(&self.flatten_map_path(), map, "flatten map")
    }

    /// Loads the flatten map.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if no map has been written, or a `Parse`
    /// error if it is unreadable.
    pub fn load_flatten_map(&self) -> Result<FlattenMap> {
        self.load_json(&self.flatten_map_path(), "flatten map", "run `repoflat flatten` first")
    }

    fn save_json<T: Serialize>(&self, path: &Path, value: &T, what: &str) -> Result<()> {
        let mut json = serde_json::to_string_pretty(value).map_err(|e| Error::parse(what, e))?;
        json.push('\n');
        self.ctx.fs.write(path, &json)?;
        log::debug!("wrote {what} to {}", path.display());
        Ok(())
    }

    fn load_json<T: DeserializeOwned>(&self, path: &Path, what: &str, hint: &str) -> Result<T> {
        if !self.ctx.fs.exists(path) {
            return Err(Error::validation(format!(
                "no {what} at {}; {hint}",
                path.display()
            )));
        }
        let contents = self.ctx.fs.read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| Error::parse(path.display().to_string(), e))
    }
}
