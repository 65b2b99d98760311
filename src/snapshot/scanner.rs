//! One sorted walk of the repository tree.

use std::path::Path;

use super::classify::{has_reserved_component, Classifier, IgnoreRules};
use super::{is_single_component, standardize, PackageManifest, RepoFile};
use crate::error::Result;
use crate::ports::{DirEntry, EntryKind, FileSystem, WalkItem};
use crate::report::{Warning, Warnings};

/// Suffix identifying an Xcode project descriptor.
pub const PROJECT_DESCRIPTOR_SUFFIX: &str = ".xcodeproj/project.pbxproj";

/// Scan settings.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// File name marking a package root.
    pub manifest_file: String,
    /// Paths to leave out of the inventory.
    pub ignore: IgnoreRules,
}

/// What the walk found.
#[derive(Debug, Clone, Default)]
pub struct RepoScan {
    /// Every regular file, classified, sorted by path.
    pub files: Vec<RepoFile>,
    /// Discovered packages sorted by name.
    pub packages: Vec<PackageManifest>,
    /// Repo-relative project descriptor paths, sorted.
    pub projects: Vec<String>,
}

/// Walks `repo_root`, classifying every regular file outside reserved and
/// ignored paths.
///
/// Symlinks are not followed. Unreadable subdirectories become warnings.
///
/// # Errors
///
/// Returns an `Io` error if `repo_root` itself cannot be read.
pub fn scan(
    fs: &dyn FileSystem,
    repo_root: &Path,
    options: &ScanOptions,
    warnings: &mut Warnings,
) -> Result<RepoScan> {
    let skip = |entry: &DirEntry| is_pruned(entry, repo_root, &options.ignore);
    let items = fs.walk(repo_root, &skip)?;

    let mut paths = Vec::new();
    let mut manifests = Vec::new();
    let mut projects = Vec::new();

    for item in items {
        let entry = match item {
            WalkItem::Entry(entry) => entry,
            WalkItem::Unreadable { path, reason } => {
                let path = relative(repo_root, &path).unwrap_or_else(|| path.display().to_string());
                warnings.push(Warning::UnreadableFile { path, reason });
                continue;
            }
        };
        if entry.kind != EntryKind::File {
            continue;
        }
        let Some(rel) = relative(repo_root, &entry.path) else {
            continue;
        };

        if entry.file_name() == options.manifest_file {
            manifests.push(rel.clone());
        }
        if rel.ends_with(PROJECT_DESCRIPTOR_SUFFIX) {
            projects.push(rel.clone());
        }
        paths.push(rel);
    }

    let packages = discover_packages(fs, repo_root, &manifests, warnings);
    let classifier = Classifier::new(&packages, &options.manifest_file);
    let mut files: Vec<RepoFile> = paths.iter().map(|p| classifier.classify(p)).collect();
    files.sort();
    projects.sort();

    log::debug!(
        "scanned {} files, {} packages, {} project descriptors",
        files.len(),
        packages.len(),
        projects.len()
    );
    Ok(RepoScan { files, packages, projects })
}

/// Reserved names drop files and whole directories alike.
fn is_pruned(entry: &DirEntry, repo_root: &Path, ignore: &IgnoreRules) -> bool {
    relative(repo_root, &entry.path).is_some_and(|rel| {
        has_reserved_component(&rel) || ignore.matches(&rel, entry.kind == EntryKind::Dir)
    })
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(standardize(&rel.to_string_lossy()))
}

/// Turns manifest paths into packages and flags nested roots.
fn discover_packages(
    fs: &dyn FileSystem,
    repo_root: &Path,
    manifests: &[String],
    warnings: &mut Warnings,
) -> Vec<PackageManifest> {
    let mut packages: Vec<PackageManifest> = manifests
        .iter()
        .map(|manifest| {
            let root_path = manifest.rsplit_once('/').map_or("", |(dir, _)| dir).to_string();
            let name = match fs.read_to_string(&repo_root.join(manifest)) {
                Ok(text) => package_name(&text).filter(|name| {
                    let usable = is_single_component(name);
                    if !usable {
                        warnings.push(Warning::InvalidPackageName {
                            manifest: manifest.clone(),
                            name: name.clone(),
                        });
                    }
                    usable
                }),
                Err(err) => {
                    warnings.push(Warning::UnreadableFile {
                        path: manifest.clone(),
                        reason: err.to_string(),
                    });
                    None
                }
            };
            let name = name.unwrap_or_else(|| fallback_name(repo_root, &root_path));
            PackageManifest { name, root_path }
        })
        .collect();
    packages.sort();

    for inner in &packages {
        for outer in &packages {
            if inner.root_path != outer.root_path
                && super::is_under(&inner.root_path, &outer.root_path)
            {
                warnings.push(Warning::NestedPackage {
                    inner: inner.name.clone(),
                    outer: outer.name.clone(),
                });
            }
        }
    }
    packages
}

/// Reads `name: "..."` from the first `Package(` declaration.
#[must_use]
pub fn package_name(manifest: &str) -> Option<String> {
    let start = manifest.find("Package(")?;
    let rest = &manifest[start..];
    let after_label = &rest[rest.find("name:")? + "name:".len()..];
    let quoted = after_label.trim_start().strip_prefix('"')?;
    let name = &quoted[..quoted.find('"')?];
    (!name.is_empty()).then(|| name.to_string())
}

fn fallback_name(repo_root: &Path, root_path: &str) -> String {
    let dir =
        if root_path.is_empty() { repo_root.to_path_buf() } else { repo_root.join(root_path) };
    dir.file_name().map_or_else(|| "root".to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::LiveFileSystem;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::snapshot::{FileKind, Owner};
    use std::fs;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn options(ignore: &str) -> ScanOptions {
        ScanOptions { manifest_file: "Package.swift".into(), ignore: IgnoreRules::parse(ignore) }
    }

    #[test]
    fn scan_classifies_packages_and_repo_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "Packages/Core/Package.swift", "let package = Package(\n  name: \"Core\",\n)");
        write(root, "Packages/Core/Sources/Core/Model.swift", "public struct Model {}");
        write(root, "Packages/Core/Tests/CoreTests/ModelTests.swift", "import XCTest");
        write(root, "App/main.swift", "import Core");
        write(root, "App/App.xcodeproj/project.pbxproj", "// !$*UTF8*$!");
        write(root, ".git/HEAD", "ref: refs/heads/main");
        write(root, ".repoflat/snapshot.json", "{}");

        let mut warnings = Warnings::new();
        let scan = scan(&LiveFileSystem, root, &options(""), &mut warnings).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(
            scan.packages,
            vec![PackageManifest { name: "Core".into(), root_path: "Packages/Core".into() }]
        );
        assert_eq!(scan.projects, vec!["App/App.xcodeproj/project.pbxproj".to_string()]);

        let paths: Vec<&str> = scan.files.iter().map(RepoFile::path).collect();
        assert_eq!(
            paths,
            vec![
                "App/App.xcodeproj/project.pbxproj",
                "App/main.swift",
                "Packages/Core/Package.swift",
                "Packages/Core/Sources/Core/Model.swift",
                "Packages/Core/Tests/CoreTests/ModelTests.swift",
            ]
        );
        let model = &scan.files[3];
        assert_eq!(model.owner(), &Owner::Package("Core".into()));
        assert_eq!(model.kind(), FileKind::Source);
        assert_eq!(scan.files[4].kind(), FileKind::Test);
        assert_eq!(scan.files[1].owner(), &Owner::Repo);
    }

    #[test]
    fn scan_honors_ignore_rules() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "App/main.swift", "");
        write(root, "build/out.swift", "");
        write(root, "App/debug.log", "");

        let mut warnings = Warnings::new();
        let scan = scan(&LiveFileSystem, root, &options("build/\n*.log\n"), &mut warnings).unwrap();
        let paths: Vec<&str> = scan.files.iter().map(RepoFile::path).collect();
        assert_eq!(paths, vec!["App/main.swift"]);
    }

    #[test]
    fn nested_packages_warn_and_inner_root_owns_its_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "Outer/Package.swift", "Package(name: \"Outer\")");
        write(root, "Outer/Inner/Package.swift", "Package(name: \"Inner\")");
        write(root, "Outer/Inner/Sources/Inner/A.swift", "");

        let mut warnings = Warnings::new();
        let scan = scan(&LiveFileSystem, root, &options(""), &mut warnings).unwrap();

        assert_eq!(
            warnings.items(),
            &[Warning::NestedPackage { inner: "Inner".into(), outer: "Outer".into() }]
        );
        let file = scan.files.iter().find(|f| f.path().ends_with("A.swift")).unwrap();
        assert_eq!(file.owner(), &Owner::Package("Inner".into()));
    }

    #[test]
    fn unreadable_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = scan(&LiveFileSystem, &missing, &options(""), &mut Warnings::new()).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io { .. }));
    }

    #[test]
    fn package_name_falls_back_to_directory() {
        assert_eq!(
            package_name("// swift-tools-version:5.9\nlet package = Package(\n    name: \"Net\","),
            Some("Net".into())
        );
        assert_eq!(package_name("let package = Package(name: packageName)"), None);

        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Vendor/Lib/Package.swift", "Package(name: computed())");
        let scan = scan(&LiveFileSystem, dir.path(), &options(""), &mut Warnings::new()).unwrap();
        assert_eq!(scan.packages[0].name, "Lib");
    }

    #[test]
    fn reserved_names_drop_files_too() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "App/main.swift", "");
        write(root, "Vendor/Sub/.git", "gitdir: ../../.git/modules/Sub");
        write(root, "Vendor/Sub/lib.swift", "");

        let scan = scan(&LiveFileSystem, root, &options(""), &mut Warnings::new()).unwrap();
        let paths: Vec<&str> = scan.files.iter().map(RepoFile::path).collect();
        assert_eq!(paths, vec!["App/main.swift", "Vendor/Sub/lib.swift"]);
    }

    #[test]
    fn unusable_package_name_falls_back_with_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "Lib/Package.swift", "Package(name: \"../../../../escaped\")");
        write(root, "Lib/Sources/Lib/L.swift", "");

        let mut warnings = Warnings::new();
        let scan = scan(&LiveFileSystem, root, &options(""), &mut warnings).unwrap();

        assert_eq!(
            scan.packages,
            vec![PackageManifest { name: "Lib".into(), root_path: "Lib".into() }]
        );
        assert_eq!(
            warnings.items(),
            &[Warning::InvalidPackageName {
                manifest: "Lib/Package.swift".into(),
                name: "../../../../escaped".into()
            }]
        );
    }

    #[test]
    fn scan_runs_against_an_in_memory_tree() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/repo/App/main.swift", "import Core");
        fs.add_file("/repo/Core/Package.swift", "Package(name: \"Core\")");
        fs.add_file("/repo/Core/Sources/Core/A.swift", "");
        fs.add_file("/repo/.git/HEAD", "ref: refs/heads/main");
        fs.add_symlink("/repo/App/alias.swift");

        let scan = scan(&fs, Path::new("/repo"), &options(""), &mut Warnings::new()).unwrap();
        let paths: Vec<&str> = scan.files.iter().map(RepoFile::path).collect();
        assert_eq!(
            paths,
            vec!["App/main.swift", "Core/Package.swift", "Core/Sources/Core/A.swift"]
        );
        assert_eq!(scan.packages[0].name, "Core");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_a_warning() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "App/main.swift", "");
        write(root, "locked/secret.swift", "");
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Privileged users read through mode 000.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut warnings = Warnings::new();
        let result = scan(&LiveFileSystem, root, &options(""), &mut warnings);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let scan = result.unwrap();
        let paths: Vec<&str> = scan.files.iter().map(RepoFile::path).collect();
        assert_eq!(paths, vec!["App/main.swift"]);
        assert!(matches!(
            warnings.items(),
            [Warning::UnreadableFile { path, .. }] if path == "locked"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_loop_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "App/main.swift", "");
        std::os::unix::fs::symlink(root.join("App"), root.join("App/loop")).unwrap();
        std::os::unix::fs::symlink(root, root.join("App/up")).unwrap();

        let mut warnings = Warnings::new();
        let scan = scan(&LiveFileSystem, root, &options(""), &mut warnings).unwrap();

        let paths: Vec<&str> = scan.files.iter().map(RepoFile::path).collect();
        assert_eq!(paths, vec!["App/main.swift"]);
        assert!(warnings.is_empty());
    }
}
