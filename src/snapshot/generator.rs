//! The snapshot stage: scan, describe, resolve closures, persist.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use super::classify::IgnoreRules;
use super::closure::ClosureResolver;
use super::imports::ImportIndex;
use super::manifest::{ManifestCache, ManifestResolver};
use super::project::compiled_files;
use super::scanner::{scan, ScanOptions};
use super::{SnapshotModel, TargetSpec};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::{Error, Result};
use crate::ports::FileSystem;
use crate::report::{Warning, Warnings};
use crate::store::ArtifactStore;

/// A persisted snapshot plus what the run noticed along the way.
#[derive(Debug)]
pub struct SnapshotOutcome {
    /// The snapshot as written to disk.
    pub snapshot: SnapshotModel,
    /// Number of files the scan classified.
    pub scanned_files: usize,
    /// Non-fatal findings.
    pub warnings: Warnings,
}

impl SnapshotOutcome {
    /// One-screen summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let short = self.snapshot.commit_hash.get(..12).unwrap_or(&self.snapshot.commit_hash);
        let mut out = format!(
            "snapshot at {short}: {} files scanned, {} package(s)",
            self.scanned_files,
            self.snapshot.packages.len()
        );
        for target in &self.snapshot.targets {
            let _ = write!(out, "\n  {}: {} file(s)", target.name, target.files.len());
        }
        let _ = write!(out, "\n{}", self.warnings.format_summary());
        out
    }
}

/// Takes a snapshot of the repository the VCS port points at.
///
/// Targets come from the config file with `cli_targets` layered on top.
///
/// # Errors
///
/// Fails on a dirty tree, bad targets, an unreadable repository root, a
/// failing description tool, or when the snapshot cannot be written.
pub fn generate(ctx: &ServiceContext, cli_targets: &[TargetSpec]) -> Result<SnapshotOutcome> {
    let repo_root = ctx.vcs.repo_root()?;
    let commit_hash = ctx.vcs.commit_hash(&repo_root)?;
    let timestamp = ctx.clock.now();

    let config = Config::load(ctx.fs.as_ref(), &repo_root)?;
    let targets = config.merged_targets(cli_targets);
    validate_targets(ctx.fs.as_ref(), &targets, &repo_root)?;

    let mut warnings = Warnings::new();
    let options = ScanOptions {
        manifest_file: config.manifest_file().to_string(),
        ignore: ignore_rules(ctx, &repo_root, &config)?,
    };
    let scanned = scan(ctx.fs.as_ref(), &repo_root, &options, &mut warnings)?;
    log::info!(
        "scanned {} files, {} package(s), {} project descriptor(s)",
        scanned.files.len(),
        scanned.packages.len(),
        scanned.projects.len()
    );

    let store = ArtifactStore::new(ctx, &repo_root);
    let resolver = ManifestResolver {
        fs: ctx.fs.as_ref(),
        describer: ctx.manifests.as_ref(),
        cache: ManifestCache::new(ctx.fs.as_ref(), store.manifest_cache_dir()),
        repo_root: &repo_root,
        manifest_file: config.manifest_file(),
    };
    let modules = resolver.resolve(&scanned.packages, &scanned.files, &mut warnings)?;

    let membership = compiled_files(ctx.fs.as_ref(), &repo_root, &scanned.projects, &mut warnings)?;
    if let Some(compiled) = &membership {
        for file in scanned.files.iter().filter(|f| f.is_repo_source()) {
            if !compiled.contains(file.path()) {
                warnings.push(Warning::UnaccountedFile { path: file.path().to_string() });
            }
        }
    }

    let imports = ImportIndex::build(ctx.fs.as_ref(), &repo_root, &scanned.files, &mut warnings);
    let closures = ClosureResolver::new(&scanned.files, &modules, &imports, membership.as_ref());
    let mut resolved = Vec::with_capacity(targets.len());
    for target in &targets {
        let snapshot = closures.resolve(target, &mut warnings);
        log::info!("target {}: {} file(s) in closure", snapshot.name, snapshot.files.len());
        resolved.push(snapshot);
    }

    let snapshot = SnapshotModel {
        timestamp,
        commit_hash,
        repo_root: repo_root.display().to_string(),
        packages: scanned.packages,
        targets: resolved,
    };
    store.save_snapshot(&snapshot)?;

    Ok(SnapshotOutcome { snapshot, scanned_files: scanned.files.len(), warnings })
}

fn validate_targets(
    fs: &dyn FileSystem,
    targets: &[TargetSpec],
    repo_root: &Path,
) -> Result<()> {
    if targets.is_empty() {
        return Err(Error::validation(
            "no targets; pass --target <name[=folder]> or list targets in .repoflat/config.yaml",
        ));
    }
    let mut seen = BTreeSet::new();
    for target in targets {
        if !seen.insert(target.name.as_str()) {
            return Err(Error::validation(format!("target {} is given twice", target.name)));
        }
        target.validate(fs, repo_root)?;
    }
    Ok(())
}

/// Root `.gitignore` plus the configured extra patterns.
fn ignore_rules(ctx: &ServiceContext, repo_root: &Path, config: &Config) -> Result<IgnoreRules> {
    let gitignore = repo_root.join(".gitignore");
    let mut rules = if ctx.fs.exists(&gitignore) {
        IgnoreRules::parse(&ctx.fs.read_to_string(&gitignore)?)
    } else {
        IgnoreRules::default()
    };
    rules.extend(config.ignore.iter().map(String::as_str));
    log::debug!("{} ignore pattern(s) in effect", rules.len());
    Ok(rules)
}
