//! `repoflat prune` command.

use std::path::Path;

use crate::cli::Verbosity;
use crate::context::ServiceContext;
use crate::error::Result;
use crate::prune::{prune, PruneOptions, PruneReport};
use crate::store::ArtifactStore;

/// Execute the `prune` command.
///
/// # Errors
///
/// Returns an error if there is no flatten map, the destination does not
/// match it, or a deletion fails.
pub fn run(
    ctx: &ServiceContext,
    destination: &Path,
    options: PruneOptions,
    verbosity: Verbosity,
) -> Result<()> {
    let repo_root = ctx.vcs.repo_root()?;
    let report = execute(ctx, &repo_root, destination, options)?;
    if verbosity.shows_summary() {
        println!("{}", report.summary());
    }
    Ok(())
}

/// Prunes `destination` against the persisted flatten map.
///
/// # Errors
///
/// See [`run`].
pub fn execute(
    ctx: &ServiceContext,
    repo_root: &Path,
    destination: &Path,
    options: PruneOptions,
) -> Result<PruneReport> {
    let map = ArtifactStore::new(ctx, repo_root).load_flatten_map()?;
    prune(ctx.fs.as_ref(), ctx.confirm.as_ref(), &map, destination, options)
}
