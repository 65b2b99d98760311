//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::error::Result;
use crate::snapshot::TargetSpec;

/// Top-level CLI parser for `repoflat`.
#[derive(Debug, Parser)]
#[command(
    name = "repoflat",
    version,
    about = "Snapshot a repository and flatten per-target dependency closures"
)]
pub struct Cli {
    /// Log every step.
    #[arg(long, short, global = true, conflicts_with_all = ["quiet", "silent"])]
    pub verbose: bool,
    /// Print errors and warnings only.
    #[arg(long, short, global = true, conflicts_with = "silent")]
    pub quiet: bool,
    /// Print errors only and skip the summary.
    #[arg(long, global = true)]
    pub silent: bool,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// How chatty a run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors only, no summary.
    Silent,
    /// Warnings and errors, no summary.
    Quiet,
    /// Summary plus progress.
    Normal,
    /// Everything down to debug.
    Verbose,
}

impl Verbosity {
    /// Log level for this verbosity.
    #[must_use]
    pub fn level(self) -> LevelFilter {
        match self {
            Self::Silent => LevelFilter::Error,
            Self::Quiet => LevelFilter::Warn,
            Self::Normal => LevelFilter::Info,
            Self::Verbose => LevelFilter::Debug,
        }
    }

    /// Whether the end-of-command summary is printed.
    #[must_use]
    pub fn shows_summary(self) -> bool {
        matches!(self, Self::Normal | Self::Verbose)
    }
}

impl Cli {
    /// Verbosity selected by the global flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.silent {
            Verbosity::Silent
        } else if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Destination flags shared by `flatten` and `sync`.
#[derive(Debug, Clone, Args)]
pub struct CopyArgs {
    /// Destination directory; falls back to `REPOFLAT_DESTINATION` or the config file.
    #[arg(long, short)]
    pub destination: Option<PathBuf>,
    /// Overwrite existing destination files after one confirmation.
    #[arg(long)]
    pub overwrite: bool,
    /// Overwrite and delete without asking.
    #[arg(long)]
    pub force: bool,
    /// Remove each target directory in the destination before copying.
    #[arg(long)]
    pub clean: bool,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the repository and record each target's dependency closure.
    Snapshot {
        /// Target as `name` or `name=entry/folder`; repeatable.
        #[arg(long = "target", short, value_parser = parse_target)]
        targets: Vec<TargetSpec>,
    },
    /// Plan destination paths and copy the closures there.
    Flatten(CopyArgs),
    /// Delete destination files the flatten map no longer lists.
    Prune {
        /// Destination the map was flattened into.
        #[arg(long, short)]
        destination: PathBuf,
        /// Report orphans without deleting them.
        #[arg(long)]
        dry_run: bool,
        /// Delete without asking.
        #[arg(long)]
        force: bool,
    },
    /// Flatten, then prune the same destination.
    Sync(CopyArgs),
    /// Reserved.
    Hydrate,
    /// Reserved.
    Rehydrate,
}

fn parse_target(arg: &str) -> Result<TargetSpec> {
    TargetSpec::parse(arg)
}
