//! Pure mapping from snapshot closures to destination paths.
//!
//! `<target>/<Sources|Resources>/<Repo|Packages/<name>>/<original path>`

use chrono::{DateTime, Utc};

use super::{FlattenMap, FlattenTarget, FlattenedFile};
use crate::snapshot::{FileKind, Owner, RepoFile, SnapshotModel, TargetSnapshot};

/// Destination-relative path of `file` within `target`, or `None` for kinds
/// that are never flattened.
#[must_use]
pub fn flattened_path(target: &str, file: &RepoFile) -> Option<String> {
    let kind_bucket = match file.kind() {
        FileKind::Source => "Sources",
        FileKind::Resource => "Resources",
        FileKind::Test | FileKind::Other => return None,
    };
    let owner_bucket = match file.owner() {
        Owner::Repo => "Repo".to_string(),
        Owner::Package(name) => format!("Packages/{name}"),
    };
    Some(format!("{target}/{kind_bucket}/{owner_bucket}/{}", file.path()))
}

/// Plans one target.
#[must_use]
pub fn plan_target(target: &TargetSnapshot) -> FlattenTarget {
    let mut files: Vec<FlattenedFile> = target
        .files
        .iter()
        .filter_map(|file| {
            flattened_path(&target.name, file).map(|flattened_path| FlattenedFile {
                original_path: file.path().to_string(),
                flattened_path,
                kind: file.kind(),
                owner: file.owner().clone(),
            })
        })
        .collect();
    files.sort_by(|a, b| a.flattened_path.cmp(&b.flattened_path));
    debug_assert!(
        files.windows(2).all(|w| w[0].flattened_path != w[1].flattened_path),
        "flattened paths collide in target {}",
        target.name
    );
    FlattenTarget { name: target.name.clone(), files }
}

/// Plans every target of a snapshot.
///
/// Identical inputs produce identical maps.
#[must_use]
pub fn plan(
    snapshot: &SnapshotModel,
    destination: Option<String>,
    created_at: DateTime<Utc>,
) -> FlattenMap {
    let mut targets: Vec<FlattenTarget> = snapshot.targets.iter().map(plan_target).collect();
    targets.sort_by(|a, b| a.name.cmp(&b.name));
    FlattenMap { created_at, destination, targets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn snapshot(targets: Vec<TargetSnapshot>) -> SnapshotModel {
        SnapshotModel {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            commit_hash: "abc".into(),
            repo_root: "/repo".into(),
            packages: vec![],
            targets,
        }
    }

    fn app_target() -> TargetSnapshot {
        TargetSnapshot {
            name: "App".into(),
            files: vec![
                RepoFile::new("App/AppTests.swift", Owner::Repo, FileKind::Test),
                RepoFile::new("App/Assets.xcassets/Contents.json", Owner::Repo, FileKind::Resource),
                RepoFile::new("App/README.md", Owner::Repo, FileKind::Other),
                RepoFile::new("App/main.swift", Owner::Repo, FileKind::Source),
                RepoFile::new(
                    "Core/Sources/Core/A.swift",
                    Owner::Package("Core".into()),
                    FileKind::Source,
                ),
            ],
        }
    }

    #[test]
    fn paths_follow_target_kind_owner_buckets() {
        let map = plan(&snapshot(vec![app_target()]), Some("/tmp/out".into()), Utc::now());
        let paths: Vec<&str> =
            map.targets[0].files.iter().map(|f| f.flattened_path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "App/Resources/Repo/App/Assets.xcassets/Contents.json",
                "App/Sources/Packages/Core/Core/Sources/Core/A.swift",
                "App/Sources/Repo/App/main.swift",
            ]
        );
    }

    #[test]
    fn tests_and_other_files_are_never_planned() {
        let file = RepoFile::new("App/AppTests.swift", Owner::Repo, FileKind::Test);
        assert_eq!(flattened_path("App", &file), None);
        let file = RepoFile::new("App/README.md", Owner::Repo, FileKind::Other);
        assert_eq!(flattened_path("App", &file), None);
    }

    #[test]
    fn planning_is_pure_and_sorted() {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut widget = app_target();
        widget.name = "Widget".into();
        let a = plan(&snapshot(vec![widget.clone(), app_target()]), None, created);
        let b = plan(&snapshot(vec![app_target(), widget]), None, created);
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
        assert_eq!(a.targets[0].name, "App");
    }

    #[test]
    fn flattened_paths_are_unique_across_owners() {
        let target = TargetSnapshot {
            name: "App".into(),
            files: vec![
                RepoFile::new("Shared/Util.swift", Owner::Repo, FileKind::Source),
                RepoFile::new("Shared/U.json", Owner::Package("Shared".into()), FileKind::Resource),
                RepoFile::new("Net/Util.swift", Owner::Package("Net".into()), FileKind::Source),
            ],
        };
        let planned = plan_target(&target);
        let unique: BTreeSet<&str> =
            planned.files.iter().map(|f| f.flattened_path.as_str()).collect();
        assert_eq!(unique.len(), planned.files.len());
    }
}
