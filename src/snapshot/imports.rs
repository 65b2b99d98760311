//! Shallow lexical import scan.
//!
//! Each line is checked against a fixed set of prefixes; nothing is parsed
//! beyond that. Conditional compilation and block comments are not
//! understood, so an import inside `#if` or `/* */` still counts.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{FileKind, RepoFile};
use crate::ports::FileSystem;
use crate::report::{Warning, Warnings};

/// Tokens that may precede `import` on the same line.
const IMPORT_MODIFIERS: &[&str] = &[
    "@testable",
    "@_exported",
    "@_implementationOnly",
    "@preconcurrency",
    "@_weakLinked",
    "public",
    "package",
    "internal",
    "fileprivate",
    "private",
];

/// `import struct Foo.Bar` style declaration kinds.
const DECLARATION_KINDS: &[&str] =
    &["typealias", "struct", "class", "enum", "protocol", "let", "var", "func"];

/// Module name imported by one line, if it is an import.
#[must_use]
pub fn import_on_line(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace();
    let mut token = tokens.next()?;
    while IMPORT_MODIFIERS.contains(&token) || token.starts_with("@_spi(") {
        token = tokens.next()?;
    }

    let module = match token {
        "import" => {
            let next = tokens.next()?;
            if DECLARATION_KINDS.contains(&next) {
                tokens.next()?
            } else {
                next
            }
        }
        "@import" => tokens.next()?,
        _ => return None,
    };

    let module = module.trim_end_matches(';');
    let module = module.split('.').next()?;
    is_identifier(module).then_some(module)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Every module `text` imports.
#[must_use]
pub fn scan_imports(text: &str) -> BTreeSet<String> {
    text.lines().filter_map(import_on_line).map(str::to_string).collect()
}

/// Imports of every `Source` file, by repo-relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportIndex {
    by_file: BTreeMap<String, BTreeSet<String>>,
}

impl ImportIndex {
    /// Reads and scans every `Source` file under `repo_root`.
    ///
    /// Unreadable files are warned about and treated as importing nothing.
    #[must_use]
    pub fn build(
        fs: &dyn FileSystem,
        repo_root: &Path,
        files: &[RepoFile],
        warnings: &mut Warnings,
    ) -> Self {
        let mut by_file = BTreeMap::new();
        for file in files.iter().filter(|f| f.kind() == FileKind::Source) {
            match fs.read_bytes(&repo_root.join(file.path())) {
                Ok(bytes) => {
                    let imports = scan_imports(&String::from_utf8_lossy(&bytes));
                    by_file.insert(file.path().to_string(), imports);
                }
                Err(err) => warnings.push(Warning::UnreadableFile {
                    path: file.path().to_string(),
                    reason: err.to_string(),
                }),
            }
        }
        Self { by_file }
    }

    /// Builds an index from known entries.
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, BTreeSet<String>)>,
        S: Into<String>,
    {
        let by_file = entries.into_iter().map(|(path, imports)| (path.into(), imports)).collect();
        Self { by_file }
    }

    /// Modules imported by `path`; empty when the file was not indexed.
    pub fn imports_of(&self, path: &str) -> impl Iterator<Item = &str> {
        self.by_file.get(path).into_iter().flatten().map(String::as_str)
    }

    /// Number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    /// Returns `true` when no file was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }
}
