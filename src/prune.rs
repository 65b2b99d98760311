//! Removes destination files the current flatten map no longer lists.
//!
//! Only the target roots (`<destination>/<target>`) are ever walked; anything
//! else in the destination is invisible to prune.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::flatten::{absolute_destination, FlattenMap};
use crate::ports::{Confirm, DirEntry, EntryKind, FileSystem, WalkItem};

/// Prune switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOptions {
    /// Report only; delete nothing.
    pub dry_run: bool,
    /// Delete without asking.
    pub force: bool,
}

/// Outcome of one prune run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Destination-relative files not in the map, sorted.
    pub orphans: Vec<String>,
    /// Destination-relative directories removed because they were empty.
    pub removed_dirs: Vec<String>,
    /// Planned files absent from the destination, sorted.
    pub missing: Vec<String>,
    /// Nothing was deleted because this was a dry run.
    pub dry_run: bool,
    /// Nothing was deleted because the confirmation was declined.
    pub declined: bool,
}

impl PruneReport {
    /// One-screen summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run || self.declined { "would remove" } else { "removed" };
        let mut out = format!(
            "{verb} {} orphaned file(s); {} empty director(ies) removed; {} missing",
            self.orphans.len(),
            self.removed_dirs.len(),
            self.missing.len()
        );
        if self.declined {
            out.push_str("\ndeletion declined; nothing was removed");
        }
        for path in &self.orphans {
            let _ = write!(out, "\n  orphan: {path}");
        }
        for path in &self.missing {
            let _ = write!(out, "\n  missing: {path}");
        }
        out
    }
}

/// Deletes orphans under each target root of `map`, then any directories
/// left empty inside those roots.
///
/// # Errors
///
/// Returns a `Validation` error for a plan-only map, a map whose paths
/// escape their target directories, or when `destination` differs from the
/// map's destination, and an `Io` error if the walk or a deletion fails.
pub fn prune(
    fs: &dyn FileSystem,
    confirm: &dyn Confirm,
    map: &FlattenMap,
    destination: &Path,
    options: PruneOptions,
) -> Result<PruneReport> {
    map.check_contained()?;
    let recorded = absolute_destination(Path::new(map.require_destination()?))?;
    let requested = absolute_destination(destination)?;
    if recorded != requested {
        return Err(Error::validation(format!(
            "destination {} does not match the flatten destination {}",
            requested.display(),
            recorded.display()
        )));
    }

    let expected = map.expected_paths();
    let roots = prune_roots(fs, map, &requested);
    let mut report = PruneReport { dry_run: options.dry_run, ..PruneReport::default() };

    report.missing = expected
        .iter()
        .filter(|p| fs.entry_kind(&requested.join(p)) != Some(EntryKind::File))
        .map(ToString::to_string)
        .collect();

    let mut orphans = BTreeSet::new();
    for root in &roots {
        for entry in walk_root(fs, root)? {
            if entry.kind == EntryKind::Dir {
                continue;
            }
            let rel = relative(&requested, &entry.path);
            if !expected.contains(rel.as_str()) {
                orphans.insert(rel);
            }
        }
    }
    report.orphans = orphans.into_iter().collect();

    if options.dry_run {
        log::info!("dry run: {} orphan(s) under {}", report.orphans.len(), requested.display());
        return Ok(report);
    }

    if !report.orphans.is_empty() {
        let prompt = format!(
            "Delete {} orphaned file(s) under {}?",
            report.orphans.len(),
            requested.display()
        );
        if !options.force && !confirm.confirm(&prompt) {
            log::warn!("prune declined; nothing deleted");
            report.declined = true;
            return Ok(report);
        }
        for orphan in &report.orphans {
            fs.remove_file(&requested.join(orphan))?;
            log::debug!("removed {orphan}");
        }
    }

    for root in &roots {
        remove_empty_dirs(fs, root, &requested, &mut report.removed_dirs)?;
    }
    log::info!(
        "pruned {} file(s) and {} director(ies) under {}",
        report.orphans.len(),
        report.removed_dirs.len(),
        requested.display()
    );
    Ok(report)
}

/// Target roots that exist as real directories.
fn prune_roots(fs: &dyn FileSystem, map: &FlattenMap, destination: &Path) -> Vec<PathBuf> {
    map.targets
        .iter()
        .map(|t| destination.join(&t.name))
        .filter(|root| fs.entry_kind(root) == Some(EntryKind::Dir))
        .collect()
}

/// Every entry under `root`; an unreadable subdirectory aborts the prune.
fn walk_root(fs: &dyn FileSystem, root: &Path) -> Result<Vec<DirEntry>> {
    fs.walk(root, &|_| false)?
        .into_iter()
        .map(|item| match item {
            WalkItem::Entry(entry) => Ok(entry),
            WalkItem::Unreadable { path, reason } => {
                Err(Error::io(path, std::io::Error::other(reason)))
            }
        })
        .collect()
}

fn remove_empty_dirs(
    fs: &dyn FileSystem,
    root: &Path,
    destination: &Path,
    removed: &mut Vec<String>,
) -> Result<()> {
    let dirs: Vec<PathBuf> = walk_root(fs, root)?
        .into_iter()
        .filter(|e| e.kind == EntryKind::Dir)
        .map(|e| e.path)
        .collect();
    // Reversed pre-order visits children before their parent, so emptied
    // chains collapse in one pass.
    for dir in dirs.iter().rev() {
        if fs.list_dir(dir)?.is_empty() {
            fs.remove_dir(dir)?;
            removed.push(relative(destination, dir));
        }
    }
    Ok(())
}

fn relative(destination: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(destination).unwrap_or(path);
    crate::snapshot::standardize(&rel.to_string_lossy())
}
