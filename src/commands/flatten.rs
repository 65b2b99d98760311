//! `repoflat flatten` command.

use std::path::{Path, PathBuf};

use crate::cli::{CopyArgs, Verbosity};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::Result;
use crate::flatten::copier::{materialize, CopyOptions, CopyReport};
use crate::flatten::{absolute_destination, planner, FlattenMap};
use crate::store::ArtifactStore;

/// What one flatten run produced.
#[derive(Debug)]
pub struct FlattenOutcome {
    /// The map as persisted.
    pub map: FlattenMap,
    /// Absolute destination, if any.
    pub destination: Option<PathBuf>,
    /// Copy results; `None` for a plan-only run.
    pub copy: Option<CopyReport>,
}

impl FlattenOutcome {
    /// One-screen summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let head = format!(
            "planned {} file(s) across {} target(s)",
            self.map.file_count(),
            self.map.targets.len()
        );
        match (&self.destination, &self.copy) {
            (Some(destination), Some(copy)) => {
                format!("{head} into {}\n{}", destination.display(), copy.summary())
            }
            _ => format!("{head}; no destination, plan only"),
        }
    }
}

/// Execute the `flatten` command.
///
/// # Errors
///
/// Returns an error if there is no snapshot, or planning or copying fails.
pub fn run(ctx: &ServiceContext, args: &CopyArgs, verbosity: Verbosity) -> Result<()> {
    let repo_root = ctx.vcs.repo_root()?;
    let outcome = execute(ctx, &repo_root, args)?;
    if verbosity.shows_summary() {
        println!("{}", outcome.summary());
    }
    Ok(())
}

/// Plans the persisted snapshot, writes the map and, with a destination,
/// copies the files.
///
/// # Errors
///
/// Returns an error if there is no snapshot, or planning or copying fails.
pub fn execute(ctx: &ServiceContext, repo_root: &Path, args: &CopyArgs) -> Result<FlattenOutcome> {
    let destination = resolve_destination(ctx, repo_root, args)?;
    execute_into(ctx, repo_root, args, destination)
}

/// Destination from the flag, the environment or the config file, made
/// absolute.
///
/// # Errors
///
/// Returns an error if the config cannot be read or the current directory
/// is unknown.
pub fn resolve_destination(
    ctx: &ServiceContext,
    repo_root: &Path,
    args: &CopyArgs,
) -> Result<Option<PathBuf>> {
    let config = Config::load(ctx.fs.as_ref(), repo_root)?;
    config.destination(args.destination.as_deref()).map(|d| absolute_destination(&d)).transpose()
}

/// Like [`execute`] with the destination already resolved.
///
/// The map is written only once it is known to stay inside its target
/// directories.
///
/// # Errors
///
/// Returns an error if there is no snapshot, or planning or copying fails.
pub fn execute_into(
    ctx: &ServiceContext,
    repo_root: &Path,
    args: &CopyArgs,
    destination: Option<PathBuf>,
) -> Result<FlattenOutcome> {
    let store = ArtifactStore::new(ctx, repo_root);
    let snapshot = store.load_snapshot()?;

    let map = planner::plan(
        &snapshot,
        destination.as_ref().map(|d| d.display().to_string()),
        ctx.clock.now(),
    );
    map.check_contained()?;
    store.save_flatten_map(&map)?;
    log::info!("wrote flatten map with {} file(s)", map.file_count());

    let copy = match &destination {
        Some(destination) => {
            let options =
                CopyOptions { overwrite: args.overwrite, force: args.force, clean: args.clean };
            let source_root = Path::new(&snapshot.repo_root);
            Some(materialize(
                ctx.fs.as_ref(),
                ctx.confirm.as_ref(),
                &map,
                source_root,
                destination,
                options,
            )?)
        }
        None => None,
    };

    Ok(FlattenOutcome { map, destination, copy })
}
