//! Flatten maps: where every closure file lands in a destination tree.

pub mod copier;
pub mod planner;

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::snapshot::{is_single_component, FileKind, Owner};

/// One planned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedFile {
    /// Repo-relative source path.
    pub original_path: String,
    /// Destination-relative path.
    pub flattened_path: String,
    /// `Source` or `Resource`.
    pub kind: FileKind,
    /// Owner, which picks the owner bucket.
    pub owner: Owner,
}

/// The planned files of one target, sorted by flattened path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenTarget {
    /// Target name; also the top-level directory in the destination.
    pub name: String,
    /// Planned files.
    pub files: Vec<FlattenedFile>,
}

/// The persisted plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenMap {
    /// When the plan was made.
    pub created_at: DateTime<Utc>,
    /// Absolute destination; `None` for a plan-only map.
    pub destination: Option<String>,
    /// Targets sorted by name.
    pub targets: Vec<FlattenTarget>,
}

impl FlattenMap {
    /// Every flattened path across all targets.
    #[must_use]
    pub fn expected_paths(&self) -> BTreeSet<&str> {
        self.targets
            .iter()
            .flat_map(|t| t.files.iter().map(|f| f.flattened_path.as_str()))
            .collect()
    }

    /// Total number of planned files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.targets.iter().map(|t| t.files.len()).sum()
    }

    /// Checks that every target is one directory name and every flattened
    /// path stays beneath its target's directory.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error naming the first offending entry.
    pub fn check_contained(&self) -> Result<()> {
        for target in &self.targets {
            if !is_single_component(&target.name) {
                return Err(Error::validation(format!(
                    "flatten map target `{}` is not a plain directory name",
                    target.name
                )));
            }
            if let Some(file) = target.files.iter().find(|f| !stays_under(&target.name, f)) {
                return Err(Error::validation(format!(
                    "flattened path `{}` for {} escapes target directory {}",
                    file.flattened_path, file.original_path, target.name
                )));
            }
        }
        Ok(())
    }

    /// The destination this map was planned for.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for a plan-only map.
    pub fn require_destination(&self) -> Result<&str> {
        self.destination.as_deref().ok_or_else(|| {
            Error::validation(
                "flatten map has no destination; run `repoflat flatten --destination <path>`",
            )
        })
    }
}

fn stays_under(target: &str, file: &FlattenedFile) -> bool {
    file.flattened_path
        .strip_prefix(target)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| rest.split('/').all(is_single_component))
}

/// Absolute, lexically standardized form of a destination path.
///
/// Relative paths are taken from the current directory. Nothing is required
/// to exist.
///
/// # Errors
///
/// Returns an `Io` error if the current directory cannot be determined.
pub fn absolute_destination(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|e| Error::io(path, e))?;
        cwd.join(path)
    };

    let mut clean = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_os_str()),
        }
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_destination_folds_dots() {
        assert_eq!(
            absolute_destination(Path::new("/tmp/./out/../flat/")).unwrap(),
            PathBuf::from("/tmp/flat")
        );
        let relative = absolute_destination(Path::new("out")).unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("out"));
    }

    fn one_file(target: &str, flattened: &str) -> FlattenMap {
        FlattenMap {
            created_at: Utc::now(),
            destination: None,
            targets: vec![FlattenTarget {
                name: target.into(),
                files: vec![FlattenedFile {
                    original_path: "Lib/Sources/Lib/L.swift".into(),
                    flattened_path: flattened.into(),
                    kind: FileKind::Source,
                    owner: Owner::Package("Lib".into()),
                }],
            }],
        }
    }

    #[test]
    fn contained_maps_pass() {
        let map = one_file("App", "App/Sources/Packages/Lib/Lib/Sources/Lib/L.swift");
        assert!(map.check_contained().is_ok());
    }

    #[test]
    fn escaping_paths_are_refused() {
        for (target, flattened) in [
            ("App", "App/Sources/Packages/../../../../escaped/Lib/Sources/Lib/L.swift"),
            ("App", "Other/Sources/Repo/L.swift"),
            ("App", "/App/Sources/Repo/L.swift"),
            ("App", "App"),
            ("App", "App/Sources//L.swift"),
            ("..", "../Sources/Repo/L.swift"),
        ] {
            let err = one_file(target, flattened).check_contained().unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{flattened} accepted");
        }
    }

    #[test]
    fn plan_only_map_has_no_destination() {
        let map = FlattenMap { created_at: Utc::now(), destination: None, targets: vec![] };
        assert!(matches!(map.require_destination(), Err(Error::Validation(_))));
        assert_eq!(map.file_count(), 0);
    }
}
