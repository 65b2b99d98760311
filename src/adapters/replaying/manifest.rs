//! Replaying adapter for the `ManifestDescriber` port.

use std::path::Path;
use std::sync::Mutex;

use crate::cassette::replayer::{replay_result, CassetteReplayer};
use crate::error::{Error, Result};
use crate::ports::manifest::ManifestDescriber;

/// Replays recorded description-tool output from a cassette.
pub struct ReplayingManifestDescriber {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingManifestDescriber {
    /// Creates a new replaying describer from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl ManifestDescriber for ReplayingManifestDescriber {
    fn describe(&self, package_root: &Path) -> Result<String> {
        let output = self
            .replayer
            .lock()
            .expect("replayer lock poisoned")
            .next_interaction("manifest", "describe")
            .output;
        replay_result(&output, "manifest::describe", |stderr| Error::ManifestTool {
            command: "recorded".into(),
            directory: package_root.to_path_buf(),
            stderr,
        })
    }
}
