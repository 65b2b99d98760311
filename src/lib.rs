//! Core library entry for the `repoflat` CLI.
//!
//! The pipeline has three stages, each runnable on its own:
//!
//! 1. **snapshot**: classify every repository file, describe packages, and
//!    resolve each target's import closure into `.repoflat/snapshot.json`.
//! 2. **flatten**: map closure files to
//!    `<target>/<Sources|Resources>/<Repo|Packages/<name>>/<path>`, persist
//!    `.repoflat/flatten.map.json`, and copy into a destination.
//! 3. **prune**: delete destination files under the target roots that the
//!    map no longer lists.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod flatten;
pub mod ports;
pub mod prune;
pub mod report;
pub mod snapshot;
pub mod store;

use clap::error::ErrorKind;
use clap::Parser;

pub use error::{Error, Result};

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns a `Validation` error when argument parsing fails, or the
/// command's error.
pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(Error::validation(err.to_string())),
    };
    init_logging(cli.verbosity());
    commands::dispatch(&cli.command, cli.verbosity())
}

/// Logs to stderr at the level the flags ask for; `RUST_LOG` can refine it.
fn init_logging(verbosity: cli::Verbosity) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(verbosity.level());
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // Ignore a second init from in-process callers.
    let _ = builder.target(env_logger::Target::Stderr).format_timestamp(None).try_init();
}
