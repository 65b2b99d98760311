//! Non-fatal findings collected across a run and surfaced in the summary.

use std::fmt;

/// A problem worth telling the user about that does not abort the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Warning {
    /// A file or directory could not be read during the scan.
    UnreadableFile {
        /// Repo-relative path (or absolute when outside the repo).
        path: String,
        /// OS error text.
        reason: String,
    },
    /// A manifest declared a name that cannot be used as a directory name.
    InvalidPackageName {
        /// Repo-relative manifest path.
        manifest: String,
        /// The declared name.
        name: String,
    },
    /// A package root lies inside another package root.
    NestedPackage {
        /// The inner package.
        inner: String,
        /// The enclosing package.
        outer: String,
    },
    /// A product or module name was already registered by an earlier package.
    DuplicateProduct {
        /// The colliding name.
        name: String,
        /// Package whose registration was kept.
        kept: String,
        /// Package whose registration was dropped.
        dropped: String,
    },
    /// An import named neither a product nor a repo-local folder.
    UnresolvedModule {
        /// Target whose closure hit the import.
        target: String,
        /// The module name.
        module: String,
    },
    /// A repo-owned source file compiled by no project descriptor.
    UnaccountedFile {
        /// Repo-relative path.
        path: String,
    },
    /// A descriptor record that could not be interpreted.
    MalformedRecord {
        /// Descriptor path.
        descriptor: String,
        /// Offending line, trimmed.
        line: String,
    },
    /// A manifest-declared source or resource that is not in the scan.
    MissingManifestEntry {
        /// Package that declared it.
        package: String,
        /// Repo-relative path it resolved to.
        path: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreadableFile { path, reason } => write!(f, "unreadable: {path} ({reason})"),
            Self::InvalidPackageName { manifest, name } => {
                write!(f, "{manifest}: package name `{name}` is not a plain directory name")
            }
            Self::NestedPackage { inner, outer } => {
                write!(f, "package {inner} is nested inside package {outer}")
            }
            Self::DuplicateProduct { name, kept, dropped } => {
                write!(f, "module {name} from {dropped} ignored; already provided by {kept}")
            }
            Self::UnresolvedModule { target, module } => {
                write!(f, "{target}: unresolved import {module}")
            }
            Self::UnaccountedFile { path } => {
                write!(f, "not compiled by any project: {path}")
            }
            Self::MalformedRecord { descriptor, line } => {
                write!(f, "{descriptor}: skipped malformed record `{line}`")
            }
            Self::MissingManifestEntry { package, path } => {
                write!(f, "{package}: declared file not found in scan: {path}")
            }
        }
    }
}

/// Ordered collection of warnings for one run.
#[derive(Debug, Default, Clone)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it.
    ///
    /// Unresolved imports are common (system frameworks) and only logged at debug.
    pub fn push(&mut self, warning: Warning) {
        if matches!(warning, Warning::UnresolvedModule { .. }) {
            log::debug!("{warning}");
        } else {
            log::warn!("{warning}");
        }
        self.items.push(warning);
    }

    /// All warnings in the order they were raised.
    #[must_use]
    pub fn items(&self) -> &[Warning] {
        &self.items
    }

    /// Number of collected warnings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Moves every warning from `other` into `self`.
    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }

    /// Formats the summary block shown after a command.
    ///
    /// Unresolved imports are folded into a single count line per target.
    #[must_use]
    pub fn format_summary(&self) -> String {
        if self.items.is_empty() {
            return "No warnings.".to_string();
        }

        let mut unresolved: std::collections::BTreeMap<&str, Vec<&str>> =
            std::collections::BTreeMap::new();
        let mut lines = vec![format!("Warnings ({}):", self.items.len())];
        for warning in &self.items {
            if let Warning::UnresolvedModule { target, module } = warning {
                unresolved.entry(target.as_str()).or_default().push(module.as_str());
            } else {
                lines.push(format!("  ! {warning}"));
            }
        }
        for (target, modules) in unresolved {
            lines.push(format!(
                "  ! {target}: {} unresolved imports ({})",
                modules.len(),
                modules.join(", ")
            ));
        }
        lines.join("\n")
    }
}
