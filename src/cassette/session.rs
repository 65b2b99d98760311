//! Recording session: one cassette per external port.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;

/// Commit stamped on cassettes when the run never asked version control.
const UNKNOWN_COMMIT: &str = "unknown";

/// Per-port recorders for one CLI invocation.
///
/// Cassettes are written to `<dir>/<port>.cassette.yaml` on [`finish`](Self::finish),
/// stamped with the commit the run observed.
pub struct RecordingSession {
    /// Recorder for clock interactions.
    pub clock: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for version-control interactions.
    pub vcs: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for manifest-tool interactions.
    pub manifest: Arc<Mutex<CassetteRecorder>>,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Starts a session writing into a fresh timestamped directory under `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn new(base: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = base.join(&timestamp);

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let make_recorder = |port: &str| -> Arc<Mutex<CassetteRecorder>> {
            let path = output_dir.join(format!("{port}.cassette.yaml"));
            let name = format!("{timestamp}-{port}");
            Arc::new(Mutex::new(CassetteRecorder::new(path, name, UNKNOWN_COMMIT)))
        };

        Ok(Self {
            clock: make_recorder("clock"),
            vcs: make_recorder("vcs"),
            manifest: make_recorder("manifest"),
            output_dir,
        })
    }

    /// Writes every cassette and returns the session directory.
    ///
    /// All adapters holding a recorder must have been dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if a recorder is still shared or a file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        fn take(arc: Arc<Mutex<CassetteRecorder>>, port: &str) -> Result<CassetteRecorder, String> {
            Arc::try_unwrap(arc)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .map_err(|e| format!("Recorder lock for {port} poisoned: {e}"))
        }

        let recorders = [
            ("clock", take(self.clock, "clock")?),
            ("vcs", take(self.vcs, "vcs")?),
            ("manifest", take(self.manifest, "manifest")?),
        ];
        let commit = recorders
            .iter()
            .find_map(|(_, recorder)| recorder.recorded_commit())
            .unwrap_or_else(|| UNKNOWN_COMMIT.to_string());

        for (port, mut recorder) in recorders {
            if recorder.is_empty() {
                continue;
            }
            recorder.set_commit(commit.as_str());
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
        }
        Ok(self.output_dir)
    }
}
