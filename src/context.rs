//! Service context bundling all port trait objects.

use std::path::{Path, PathBuf};

use crate::adapters::live::{
    AutoConfirm, LiveClock, LiveFileSystem, LiveGitRepo, LiveManifestDescriber, TerminalConfirm,
};
use crate::adapters::recording::{RecordingClock, RecordingManifestDescriber, RecordingVcsRepo};
use crate::adapters::replaying::{ReplayingClock, ReplayingManifestDescriber, ReplayingVcsRepo};
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::manifest_tool_from_env;
use crate::error::{Error, Result};
use crate::ports::{Clock, Confirm, FileSystem, ManifestDescriber, VcsRepo};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, replaying, recording).
pub struct ServiceContext {
    /// Clock for snapshot and plan timestamps.
    pub clock: Box<dyn Clock>,
    /// Filesystem for the repository, the destination and the artifacts.
    pub fs: Box<dyn FileSystem>,
    /// Version-control queries.
    pub vcs: Box<dyn VcsRepo>,
    /// Package description tool.
    pub manifests: Box<dyn ManifestDescriber>,
    /// Decision provider for destructive steps.
    pub confirm: Box<dyn Confirm>,
}

impl ServiceContext {
    /// Creates a live context: real clock, disk, git, description tool and
    /// terminal prompts.
    #[must_use]
    pub fn live() -> Self {
        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            vcs: Box::new(LiveGitRepo),
            manifests: Box::new(live_describer()),
            confirm: Box::new(TerminalConfirm),
        }
    }

    /// Creates a live context whose clock, VCS and manifest interactions are
    /// recorded into a new session under `base`.
    ///
    /// The returned session must be finished after the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the session directory cannot be created.
    pub fn recording_at(base: PathBuf) -> Result<(Self, RecordingSession)> {
        let session = RecordingSession::new(&base)
            .map_err(|e| Error::validation(format!("cannot start recording: {e}")))?;
        let ctx = Self {
            clock: Box::new(RecordingClock::new(Box::new(LiveClock), session.clock.clone())),
            fs: Box::new(LiveFileSystem),
            vcs: Box::new(RecordingVcsRepo::new(Box::new(LiveGitRepo), session.vcs.clone())),
            manifests: Box::new(RecordingManifestDescriber::new(
                Box::new(live_describer()),
                session.manifest.clone(),
            )),
            confirm: Box::new(TerminalConfirm),
        };
        Ok((ctx, session))
    }

    /// Creates a context replaying a recorded cassette file.
    ///
    /// The filesystem stays live. Confirmations are always declined, so
    /// destructive steps need an explicit force.
    ///
    /// # Errors
    ///
    /// Returns an `Io` or `Parse` error if the cassette cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let cassette = Cassette::from_yaml(&yaml, &path.display().to_string())?;
        Ok(Self::replaying_cassette(&cassette))
    }

    /// Creates a replaying context from a recorded session directory, merging
    /// every `*.cassette.yaml` in it.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the directory cannot be listed, or an error
    /// from loading any cassette.
    pub fn replaying_session(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| Error::io(dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.to_string_lossy().ends_with(".cassette.yaml"))
            .collect();
        paths.sort();

        let mut merged: Option<Cassette> = None;
        for path in paths {
            let yaml = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            let cassette = Cassette::from_yaml(&yaml, &path.display().to_string())?;
            match merged.as_mut() {
                Some(all) => all.interactions.extend(cassette.interactions),
                None => merged = Some(cassette),
            }
        }
        let merged = merged.ok_or_else(|| {
            Error::validation(format!("no cassettes in {}", dir.display()))
        })?;
        Ok(Self::replaying_cassette(&merged))
    }

    /// Creates a replaying context from an in-memory cassette.
    #[must_use]
    pub fn replaying_cassette(cassette: &Cassette) -> Self {
        Self {
            clock: Box::new(ReplayingClock::new(CassetteReplayer::new(cassette))),
            fs: Box::new(LiveFileSystem),
            vcs: Box::new(ReplayingVcsRepo::new(CassetteReplayer::new(cassette))),
            manifests: Box::new(ReplayingManifestDescriber::new(CassetteReplayer::new(cassette))),
            confirm: Box::new(AutoConfirm(false)),
        }
    }
}

fn live_describer() -> LiveManifestDescriber {
    manifest_tool_from_env().map_or_else(LiveManifestDescriber::default, |command| {
        LiveManifestDescriber::new(&command)
    })
}
