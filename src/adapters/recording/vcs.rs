//! Recording adapter for the `VcsRepo` port.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{record_result, PathInput};
use crate::cassette::recorder::CassetteRecorder;
use crate::error::Result;
use crate::ports::VcsRepo;

/// Records VCS answers while delegating to an inner implementation.
pub struct RecordingVcsRepo {
    inner: Box<dyn VcsRepo>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingVcsRepo {
    /// Wraps `inner`, appending every call to `recorder`.
    pub fn new(inner: Box<dyn VcsRepo>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl VcsRepo for RecordingVcsRepo {
    fn repo_root(&self) -> Result<PathBuf> {
        let result = self.inner.repo_root();
        record_result(&self.recorder, "vcs", "repo_root", &(), &result);
        result
    }

    fn commit_hash(&self, root: &Path) -> Result<String> {
        let result = self.inner.commit_hash(root);
        record_result(&self.recorder, "vcs", "commit_hash", &PathInput::new(root), &result);
        result
    }
}
