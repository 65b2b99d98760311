//! `repoflat sync` command: flatten, then prune the same destination.

use std::path::Path;

use crate::cli::{CopyArgs, Verbosity};
use crate::commands::flatten::{self, FlattenOutcome};
use crate::commands::prune;
use crate::context::ServiceContext;
use crate::error::{Error, Result};
use crate::prune::{PruneOptions, PruneReport};

/// Execute the `sync` command.
///
/// # Errors
///
/// Returns a `Validation` error when no destination is configured, or any
/// error from the flatten or prune steps.
pub fn run(ctx: &ServiceContext, args: &CopyArgs, verbosity: Verbosity) -> Result<()> {
    let repo_root = ctx.vcs.repo_root()?;
    let (flattened, pruned) = execute(ctx, &repo_root, args)?;
    if verbosity.shows_summary() {
        println!("{}", flattened.summary());
        println!("{}", pruned.summary());
    }
    Ok(())
}

/// Flattens into the resolved destination, then prunes it.
///
/// The destination is required before anything is written, so a refused
/// sync leaves the previous flatten map in place.
///
/// # Errors
///
/// See [`run`].
pub fn execute(
    ctx: &ServiceContext,
    repo_root: &Path,
    args: &CopyArgs,
) -> Result<(FlattenOutcome, PruneReport)> {
    let Some(destination) = flatten::resolve_destination(ctx, repo_root, args)? else {
        return Err(Error::validation(
            "sync needs a destination; pass --destination or set REPOFLAT_DESTINATION",
        ));
    };

    let flattened = flatten::execute_into(ctx, repo_root, args, Some(destination.clone()))?;
    let options = PruneOptions { dry_run: false, force: args.force };
    let pruned = prune::execute(ctx, repo_root, &destination, options)?;
    Ok((flattened, pruned))
}
