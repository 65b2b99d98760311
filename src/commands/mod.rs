//! Command dispatch and handlers.

pub mod flatten;
pub mod hydrate;
pub mod prune;
pub mod snapshot;
pub mod sync;

use std::env;
use std::path::PathBuf;

use crate::cassette::session::RecordingSession;
use crate::cli::{Command, Verbosity};
use crate::config::ENV_RECORD;
use crate::context::ServiceContext;
use crate::error::{Error, Result};

/// Dispatch a parsed command to its handler.
///
/// When `REPOFLAT_RECORD` names a directory, clock, VCS and manifest
/// interactions are recorded into a new session there.
///
/// # Errors
///
/// Returns the handler's error, or a `Validation` error if the recording
/// cannot be saved.
pub fn dispatch(command: &Command, verbosity: Verbosity) -> Result<()> {
    let (ctx, session) = match env::var(ENV_RECORD) {
        Ok(path) if !path.trim().is_empty() => {
            let (ctx, session) = ServiceContext::recording_at(PathBuf::from(path))?;
            (ctx, Some(session))
        }
        _ => (ServiceContext::live(), None),
    };

    let result = dispatch_with_context(command, &ctx, verbosity);

    if let Some(session) = session {
        // Recorders share the session through Arcs held by the context.
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns the handler's error.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    verbosity: Verbosity,
) -> Result<()> {
    match command {
        Command::Snapshot { targets } => snapshot::run(ctx, targets, verbosity),
        Command::Flatten(args) => flatten::run(ctx, args, verbosity),
        Command::Prune { destination, dry_run, force } => prune::run(
            ctx,
            destination,
            crate::prune::PruneOptions { dry_run: *dry_run, force: *force },
            verbosity,
        ),
        Command::Sync(args) => sync::run(ctx, args, verbosity),
        Command::Hydrate => hydrate::run("hydrate"),
        Command::Rehydrate => hydrate::run("rehydrate"),
    }
}

fn finish_recording(session: RecordingSession) -> Result<()> {
    let output_dir = session
        .finish()
        .map_err(|e| Error::validation(format!("cannot save recording: {e}")))?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
