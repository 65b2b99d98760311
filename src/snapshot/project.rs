//! Xcode project descriptors: which repo files a project actually compiles.
//!
//! `project.pbxproj` is an old-style plist, but the two record kinds we need
//! are written one per line:
//!
//! ```text
//! 1A2B /* main.swift in Sources */ = {isa = PBXBuildFile; fileRef = 3C4D /* main.swift */; };
//! 3C4D /* main.swift */ = {isa = PBXFileReference; path = main.swift; sourceTree = "<group>"; };
//! ```
//!
//! Build records point at file references; only referenced files count as
//! compiled. Records may appear in any order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::{join_rel, standardize};
use crate::error::Result;
use crate::ports::FileSystem;
use crate::report::{Warning, Warnings};

/// A file reference record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    /// Declared path.
    pub path: String,
    /// Declared `sourceTree`, if any.
    pub source_tree: Option<String>,
}

/// Records parsed from one descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRecords {
    /// Build-file id to the file reference id it compiles.
    pub build_files: BTreeMap<String, String>,
    /// File reference id to its record.
    pub file_references: BTreeMap<String, FileReference>,
    /// Lines that looked like records but could not be read.
    pub malformed: Vec<String>,
}

impl ProjectRecords {
    /// Parses descriptor text line by line.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut records = Self::default();
        for line in text.lines() {
            records.parse_line(line);
        }
        records
    }

    fn parse_line(&mut self, line: &str) {
        let line = strip_comments(line);
        let Some(fields) = record_fields(&line) else {
            return;
        };
        let isa = fields.get("isa").map(String::as_str);
        if !matches!(isa, Some("PBXBuildFile" | "PBXFileReference")) {
            return;
        }
        let Some(id) = record_id(&line) else {
            self.malformed.push(line.trim().to_string());
            return;
        };

        if isa == Some("PBXBuildFile") {
            match fields.get("fileRef") {
                Some(file_ref) => {
                    self.build_files.insert(id, file_ref.clone());
                }
                // Package product dependencies carry `productRef` instead.
                None if fields.contains_key("productRef") => {}
                None => self.malformed.push(line.trim().to_string()),
            }
        } else {
            match fields.get("path") {
                Some(path) => {
                    let source_tree = fields.get("sourceTree").cloned();
                    self.file_references
                        .insert(id, FileReference { path: path.clone(), source_tree });
                }
                None => self.malformed.push(line.trim().to_string()),
            }
        }
    }

    /// File references that some build record points at.
    pub fn compiled_references(&self) -> impl Iterator<Item = &FileReference> {
        self.build_files.values().filter_map(|id| self.file_references.get(id))
    }
}

/// Drops `/* ... */` comments outside quoted strings.
fn strip_comments(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        if in_quotes {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == '"' {
                in_quotes = false;
            }
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut prev = '\0';
            for c in chars.by_ref() {
                if prev == '*' && c == '/' {
                    break;
                }
                prev = c;
            }
        } else {
            if c == '"' {
                in_quotes = true;
            }
            out.push(c);
        }
    }
    out
}

/// The object id before `=`.
fn record_id(line: &str) -> Option<String> {
    let id = line.split('=').next()?.trim();
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .then(|| id.to_string())
}

/// `key = value;` pairs between the first `{` and the last `}`.
fn record_fields(line: &str) -> Option<BTreeMap<String, String>> {
    let open = line.find('{')?;
    let close = line.rfind('}')?;
    if close <= open {
        return None;
    }
    let body = &line[open + 1..close];

    let mut fields = BTreeMap::new();
    for pair in split_unquoted(body, ';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        fields.insert(key.to_string(), unquote(value.trim()));
    }
    Some(fields)
}

fn split_unquoted(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' && in_quotes {
            escaped = true;
        } else if c == '"' {
            in_quotes = !in_quotes;
        } else if c == separator && !in_quotes {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// Repo-relative path of a reference, or `None` when its tree is not one we
/// can place.
///
/// `project_dir` is the repo-relative directory containing the `.xcodeproj`.
#[must_use]
pub fn resolve_reference(
    reference: &FileReference,
    repo_root: &Path,
    project_dir: &str,
) -> Option<String> {
    let absolute =
        reference.source_tree.as_deref() == Some("<absolute>") || reference.path.starts_with('/');
    let rel = if absolute {
        let stripped = Path::new(&reference.path).strip_prefix(repo_root).ok()?;
        standardize(&stripped.to_string_lossy())
    } else {
        match reference.source_tree.as_deref() {
            None | Some("<group>" | "SOURCE_ROOT") => join_rel(project_dir, &reference.path),
            Some(_) => return None,
        }
    };
    (!rel.is_empty() && !rel.starts_with("..")).then_some(rel)
}

/// Compiled repo-relative paths across every descriptor.
///
/// Returns `None` when there are no descriptors, meaning membership is not
/// constrained.
///
/// # Errors
///
/// Returns an `Io` error if a descriptor cannot be read.
pub fn compiled_files(
    fs: &dyn FileSystem,
    repo_root: &Path,
    descriptors: &[String],
    warnings: &mut Warnings,
) -> Result<Option<BTreeSet<String>>> {
    if descriptors.is_empty() {
        return Ok(None);
    }
    let mut compiled = BTreeSet::new();
    for descriptor in descriptors {
        let text = fs.read_to_string(&repo_root.join(descriptor))?;
        let records = ProjectRecords::parse(&text);
        for line in &records.malformed {
            warnings.push(Warning::MalformedRecord {
                descriptor: descriptor.clone(),
                line: line.clone(),
            });
        }

        let project_dir = project_dir(descriptor);
        let before = compiled.len();
        for reference in records.compiled_references() {
            match resolve_reference(reference, repo_root, &project_dir) {
                Some(rel) if fs.exists(&repo_root.join(&rel)) => {
                    compiled.insert(rel);
                }
                Some(rel) => log::debug!("{descriptor}: compiled file {rel} not on disk"),
                None => log::debug!("{descriptor}: skipped reference {}", reference.path),
            }
        }
        log::debug!("{descriptor}: {} compiled files", compiled.len() - before);
    }
    Ok(Some(compiled))
}

/// Directory containing the `.xcodeproj` bundle of a descriptor path.
fn project_dir(descriptor: &str) -> String {
    let bundle = descriptor.rsplit_once('/').map_or("", |(dir, _)| dir);
    bundle.rsplit_once('/').map_or(String::new(), |(dir, _)| dir.to_string())
}
