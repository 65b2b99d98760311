//! Materializes a flatten map into its destination.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::FlattenMap;
use crate::error::Result;
use crate::ports::{Confirm, EntryKind, FileSystem};

/// How `materialize` treats files already present in the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Overwrite existing files after one confirmation.
    pub overwrite: bool,
    /// Overwrite and clean without asking.
    pub force: bool,
    /// Remove every target root before copying.
    pub clean: bool,
}

/// Outcome of one materialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Files written to previously empty slots.
    pub copied: usize,
    /// Existing files replaced.
    pub overwritten: usize,
    /// Existing files left alone.
    pub skipped: usize,
    /// Repo paths listed in the map but gone from disk.
    pub missing: Vec<String>,
    /// Target roots removed by `--clean`.
    pub cleaned: Vec<String>,
}

impl CopyReport {
    /// One-screen summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "copied {}, overwritten {}, skipped {}, missing {}",
            self.copied,
            self.overwritten,
            self.skipped,
            self.missing.len()
        );
        if !self.cleaned.is_empty() {
            let _ = write!(out, "\ncleaned: {}", self.cleaned.join(", "));
        }
        for path in &self.missing {
            let _ = write!(out, "\n  missing: {path}");
        }
        out
    }
}

/// Copies every planned file from `repo_root` into `destination`.
///
/// `confirm` is asked at most once per destructive step. Nothing is written
/// unless every planned path stays inside its target directory.
///
/// # Errors
///
/// Returns a `Validation` error for a map whose paths escape their target
/// directories, and an `Io` error if a directory cannot be created or
/// removed, or a file cannot be copied.
pub fn materialize(
    fs: &dyn FileSystem,
    confirm: &dyn Confirm,
    map: &FlattenMap,
    repo_root: &Path,
    destination: &Path,
    options: CopyOptions,
) -> Result<CopyReport> {
    map.check_contained()?;
    let mut report = CopyReport::default();

    if options.clean {
        clean_target_roots(fs, confirm, map, destination, options.force, &mut report)?;
    }

    let overwrite =
        options.force || (options.overwrite && confirm_overwrite(fs, confirm, map, destination));

    for target in &map.targets {
        for file in &target.files {
            let source = repo_root.join(&file.original_path);
            if fs.entry_kind(&source) != Some(EntryKind::File) {
                log::warn!("{} vanished since the snapshot; skipping", file.original_path);
                report.missing.push(file.original_path.clone());
                continue;
            }

            let dest = destination.join(&file.flattened_path);
            let existing = fs.entry_kind(&dest);
            if existing.is_some() && !overwrite {
                log::debug!("keeping existing {}", dest.display());
                report.skipped += 1;
                continue;
            }

            // Replace a link rather than write through it.
            if existing == Some(EntryKind::Symlink) {
                fs.remove_file(&dest)?;
            }
            fs.copy_file(&source, &dest)?;
            log::trace!("{} -> {}", file.original_path, dest.display());
            if existing.is_some() {
                report.overwritten += 1;
            } else {
                report.copied += 1;
            }
        }
    }

    log::info!(
        "flattened {} files into {}",
        report.copied + report.overwritten,
        destination.display()
    );
    Ok(report)
}

fn target_roots(map: &FlattenMap, destination: &Path) -> Vec<PathBuf> {
    map.targets.iter().map(|t| destination.join(&t.name)).collect()
}

fn clean_target_roots(
    fs: &dyn FileSystem,
    confirm: &dyn Confirm,
    map: &FlattenMap,
    destination: &Path,
    force: bool,
    report: &mut CopyReport,
) -> Result<()> {
    let present: Vec<(PathBuf, EntryKind)> = target_roots(map, destination)
        .into_iter()
        .filter_map(|root| fs.entry_kind(&root).map(|kind| (root, kind)))
        .collect();
    if present.is_empty() {
        return Ok(());
    }

    let prompt = format!(
        "Remove {} target director{} under {} before copying?",
        present.len(),
        if present.len() == 1 { "y" } else { "ies" },
        destination.display()
    );
    if !force && !confirm.confirm(&prompt) {
        log::warn!("clean declined; copying over the existing tree");
        return Ok(());
    }

    for (root, kind) in present {
        if kind == EntryKind::Dir {
            fs.remove_dir_all(&root)?;
        } else {
            fs.remove_file(&root)?;
        }
        log::info!("removed {}", root.display());
        report.cleaned.push(root.display().to_string());
    }
    Ok(())
}

fn confirm_overwrite(
    fs: &dyn FileSystem,
    confirm: &dyn Confirm,
    map: &FlattenMap,
    destination: &Path,
) -> bool {
    let existing = map
        .targets
        .iter()
        .flat_map(|t| &t.files)
        .filter(|f| fs.entry_kind(&destination.join(&f.flattened_path)).is_some())
        .count();
    if existing == 0 {
        return true;
    }
    let accepted = confirm.confirm(&format!(
        "Overwrite {existing} existing file{} in {}?",
        if existing == 1 { "" } else { "s" },
        destination.display()
    ));
    if !accepted {
        log::warn!("overwrite declined; keeping {existing} existing files");
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::{AutoConfirm, LiveFileSystem};
    use crate::adapters::memory::MemoryFileSystem;
    use crate::error::Error;
    use crate::flatten::{FlattenTarget, FlattenedFile};
    use crate::snapshot::{FileKind, Owner};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::Mutex;

    const CORE: &str = "App/Sources/Packages/Core/Core/Sources/Core/A.swift";

    /// Records prompts and answers with a fixed decision.
    struct Scripted {
        answer: bool,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(answer: bool) -> Self {
            Self { answer, prompts: Mutex::new(vec![]) }
        }
    }

    impl Confirm for Scripted {
        fn confirm(&self, prompt: &str) -> bool {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answer
        }
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn planned(original: &str, flattened: &str, owner: Owner) -> FlattenedFile {
        FlattenedFile {
            original_path: original.into(),
            flattened_path: flattened.into(),
            kind: FileKind::Source,
            owner,
        }
    }

    fn map(destination: &Path) -> FlattenMap {
        FlattenMap {
            created_at: Utc::now(),
            destination: Some(destination.display().to_string()),
            targets: vec![FlattenTarget {
                name: "App".into(),
                files: vec![
                    planned("App/main.swift", "App/Sources/Repo/App/main.swift", Owner::Repo),
                    planned("Core/Sources/Core/A.swift", CORE, Owner::Package("Core".into())),
                ],
            }],
        }
    }

    fn repo() -> tempfile::TempDir {
        let repo = tempfile::tempdir().unwrap();
        write(&repo.path().join("App/main.swift"), "import Core\n");
        write(&repo.path().join("Core/Sources/Core/A.swift"), "struct A {}\n");
        repo
    }

    /// Materializes the sample map from `repo` into `out` on disk.
    fn copy_live(
        confirm: &dyn Confirm,
        repo: &Path,
        out: &Path,
        options: CopyOptions,
    ) -> Result<CopyReport> {
        materialize(&LiveFileSystem, confirm, &map(out), repo, out, options)
    }

    #[test]
    fn copies_into_empty_destination() {
        let repo = repo();
        let out = tempfile::tempdir().unwrap();
        let report =
            copy_live(&AutoConfirm(false), repo.path(), out.path(), CopyOptions::default())
                .unwrap();

        assert_eq!(report.copied, 2);
        assert_eq!(fs::read_to_string(out.path().join(CORE)).unwrap(), "struct A {}\n");
    }

    #[test]
    fn existing_files_are_skipped_by_default() {
        let repo = repo();
        let out = tempfile::tempdir().unwrap();
        let existing = out.path().join("App/Sources/Repo/App/main.swift");
        write(&existing, "old");

        let confirm = Scripted::new(true);
        let report = copy_live(&confirm, repo.path(), out.path(), CopyOptions::default()).unwrap();

        assert_eq!((report.copied, report.skipped), (1, 1));
        assert_eq!(fs::read_to_string(existing).unwrap(), "old");
        assert!(confirm.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn declined_overwrite_falls_back_to_skip() {
        let repo = repo();
        let out = tempfile::tempdir().unwrap();
        let existing = out.path().join("App/Sources/Repo/App/main.swift");
        write(&existing, "old");

        let confirm = Scripted::new(false);
        let options = CopyOptions { overwrite: true, ..CopyOptions::default() };
        let report = copy_live(&confirm, repo.path(), out.path(), options).unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(confirm.prompts.lock().unwrap().len(), 1);
        assert_eq!(fs::read_to_string(existing).unwrap(), "old");
    }

    #[test]
    fn force_overwrites_without_asking() {
        let repo = repo();
        let out = tempfile::tempdir().unwrap();
        let existing = out.path().join("App/Sources/Repo/App/main.swift");
        write(&existing, "old");

        let confirm = Scripted::new(false);
        let options = CopyOptions { force: true, ..CopyOptions::default() };
        let report = copy_live(&confirm, repo.path(), out.path(), options).unwrap();

        assert_eq!((report.copied, report.overwritten), (1, 1));
        assert_eq!(fs::read_to_string(existing).unwrap(), "import Core\n");
        assert!(confirm.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn clean_removes_only_target_roots() {
        let repo = repo();
        let out = tempfile::tempdir().unwrap();
        write(&out.path().join("App/stale.swift"), "stale");
        write(&out.path().join("unrelated/readme.txt"), "keep");

        let options = CopyOptions { clean: true, force: true, ..CopyOptions::default() };
        let report = copy_live(&AutoConfirm(false), repo.path(), out.path(), options).unwrap();

        assert_eq!(report.cleaned.len(), 1);
        assert!(!out.path().join("App/stale.swift").exists());
        assert!(out.path().join("unrelated/readme.txt").exists());
        assert_eq!(report.copied, 2);
    }

    #[test]
    fn vanished_sources_are_reported_missing() {
        let repo = repo();
        fs::remove_file(repo.path().join("Core/Sources/Core/A.swift")).unwrap();
        let out = tempfile::tempdir().unwrap();

        let report =
            copy_live(&AutoConfirm(true), repo.path(), out.path(), CopyOptions::default())
                .unwrap();

        assert_eq!(report.missing, vec!["Core/Sources/Core/A.swift".to_string()]);
        assert_eq!(report.copied, 1);
        assert!(report.summary().contains("missing: Core/Sources/Core/A.swift"));
    }

    #[test]
    fn copies_through_the_filesystem_port() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/repo/App/main.swift", "import Core\n");
        fs.add_file("/repo/Core/Sources/Core/A.swift", "struct A {}\n");
        fs.add_symlink("/out/App/Sources/Repo/App/main.swift");
        let out = Path::new("/out");

        let options = CopyOptions { force: true, ..CopyOptions::default() };
        let report =
            materialize(&fs, &AutoConfirm(false), &map(out), Path::new("/repo"), out, options)
                .unwrap();

        assert_eq!((report.copied, report.overwritten), (1, 1));
        assert_eq!(
            fs.entry_kind(Path::new("/out/App/Sources/Repo/App/main.swift")),
            Some(EntryKind::File)
        );
        assert_eq!(fs.contents(out.join(CORE)).as_deref(), Some("struct A {}\n"));
    }

    #[test]
    fn package_name_with_parent_components_cannot_escape_destination() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/tmp/repo/Lib/Sources/Lib/L.swift", "public struct L {}\n");
        let out = Path::new("/tmp/dest");
        let escaping = FlattenMap {
            created_at: Utc::now(),
            destination: Some(out.display().to_string()),
            targets: vec![FlattenTarget {
                name: "App".into(),
                files: vec![planned(
                    "Lib/Sources/Lib/L.swift",
                    "App/Sources/Packages/../../../../escaped/Lib/Sources/Lib/L.swift",
                    Owner::Package("../../../../escaped".into()),
                )],
            }],
        };

        let options = CopyOptions { force: true, clean: true, ..CopyOptions::default() };
        let repo = Path::new("/tmp/repo");
        let err =
            materialize(&fs, &AutoConfirm(true), &escaping, repo, out, options).unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(fs.paths_under("/tmp/escaped").is_empty());
        assert!(fs.paths_under(out).is_empty());
    }
}
