//! Recording adapter for the `ManifestDescriber` port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{record_result, PathInput};
use crate::cassette::recorder::CassetteRecorder;
use crate::error::Result;
use crate::ports::ManifestDescriber;

/// Records description-tool output while delegating to an inner describer.
pub struct RecordingManifestDescriber {
    inner: Box<dyn ManifestDescriber>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingManifestDescriber {
    /// Wraps `inner`, appending every call to `recorder`.
    pub fn new(inner: Box<dyn ManifestDescriber>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ManifestDescriber for RecordingManifestDescriber {
    fn describe(&self, package_root: &Path) -> Result<String> {
        let result = self.inner.describe(package_root);
        let input = PathInput::new(package_root);
        record_result(&self.recorder, "manifest", "describe", &input, &result);
        result
    }
}
