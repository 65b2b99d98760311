//! `repoflat snapshot` command.

use crate::cli::Verbosity;
use crate::context::ServiceContext;
use crate::error::Result;
use crate::snapshot::generator;
use crate::snapshot::TargetSpec;

/// Execute the `snapshot` command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be taken or written.
pub fn run(ctx: &ServiceContext, targets: &[TargetSpec], verbosity: Verbosity) -> Result<()> {
    let outcome = generator::generate(ctx, targets)?;
    if verbosity.shows_summary() {
        println!("{}", outcome.summary());
    }
    Ok(())
}
