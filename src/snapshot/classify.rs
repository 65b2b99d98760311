//! Path-based ownership and kind classification, plus ignore rules.

use super::{is_under, FileKind, Owner, PackageManifest, RepoFile};

/// Control directory the tool keeps its artifacts in.
pub const CONTROL_DIR: &str = ".repoflat";

/// Directory names never scanned regardless of ignore rules.
pub const RESERVED_COMPONENTS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".build",
    ".swiftpm",
    "DerivedData",
    "xcuserdata",
    CONTROL_DIR,
];

const SOURCE_EXTENSIONS: &[&str] = &["swift", "m", "mm", "h", "c", "cc", "cpp", "hpp"];

const RESOURCE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "pdf", "svg", "json", "plist", "strings", "stringsdict",
    "xib", "storyboard", "ttf", "otf", "mp3", "wav", "m4a", "mp4", "mov", "txt", "xml",
    "yaml", "yml", "csv", "html", "css", "js", "metal", "xcprivacy", "mlmodel", "xcstrings",
];

const TEST_DIRECTORIES: &[&str] = &["Tests", "Test", "tests", "UITests"];

const RESOURCE_DIRECTORY_SUFFIXES: &[&str] = &[".xcassets", ".bundle", ".lproj"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum IgnorePattern {
    /// `name/`: any directory component, or a path prefix when `name` has a `/`.
    Directory(String),
    /// `*suffix`: any path ending with `suffix`.
    Suffix(String),
    /// Anything else: the exact path or a prefix of it.
    Path(String),
}

/// Patterns from `.gitignore` plus configured extras.
///
/// Only a small subset of gitignore syntax is honored; negations and
/// wildcards other than a leading `*` are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreRules {
    /// Parses ignore-file text, one pattern per line.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut rules = Self::default();
        rules.extend(text.lines());
        rules
    }

    /// Adds more patterns.
    pub fn extend<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            if let Some(pattern) = parse_pattern(line) {
                self.patterns.push(pattern);
            }
        }
    }

    /// Number of active patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` when no pattern is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Tests a repo-relative path. `is_dir` lets directory patterns match the
    /// directory itself rather than only its contents.
    #[must_use]
    pub fn matches(&self, path: &str, is_dir: bool) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            IgnorePattern::Directory(name) if name.contains('/') => is_under(path, name),
            IgnorePattern::Directory(name) => {
                let components: Vec<&str> = path.split('/').collect();
                let dirs =
                    if is_dir { &components[..] } else { &components[..components.len() - 1] };
                dirs.iter().any(|c| *c == name.as_str())
            }
            IgnorePattern::Suffix(suffix) => path.ends_with(suffix.as_str()),
            IgnorePattern::Path(prefix) => is_under(path, prefix),
        })
    }
}

fn parse_pattern(line: &str) -> Option<IgnorePattern> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }
    let line = line.trim_start_matches('/');
    if let Some(suffix) = line.strip_prefix('*') {
        if suffix.is_empty() || suffix.contains(['*', '?', '[']) {
            log::debug!("ignore pattern `{line}` not supported, skipped");
            return None;
        }
        return Some(IgnorePattern::Suffix(suffix.to_string()));
    }
    if line.contains(['*', '?', '[']) {
        log::debug!("ignore pattern `{line}` not supported, skipped");
        return None;
    }
    match line.strip_suffix('/') {
        Some(dir) if !dir.is_empty() => Some(IgnorePattern::Directory(dir.to_string())),
        Some(_) => None,
        None if line.is_empty() => None,
        None => Some(IgnorePattern::Path(line.to_string())),
    }
}

/// `true` when any component of `path` is a reserved directory name.
#[must_use]
pub fn has_reserved_component(path: &str) -> bool {
    path.split('/').any(|c| RESERVED_COMPONENTS.contains(&c))
}

/// Assigns owners and kinds to repo-relative paths.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Package roots, longest first, so the innermost root wins.
    roots: Vec<PackageManifest>,
    manifest_file: String,
}

impl Classifier {
    /// Builds a classifier over the discovered packages.
    #[must_use]
    pub fn new(packages: &[PackageManifest], manifest_file: &str) -> Self {
        let mut roots = packages.to_vec();
        roots.sort_by(|a, b| {
            b.root_path.len().cmp(&a.root_path.len()).then_with(|| a.name.cmp(&b.name))
        });
        Self { roots, manifest_file: manifest_file.to_string() }
    }

    /// The innermost package whose root contains `path`, else the repo.
    #[must_use]
    pub fn owner(&self, path: &str) -> Owner {
        self.roots
            .iter()
            .find(|pkg| is_under(path, &pkg.root_path))
            .map_or(Owner::Repo, |pkg| Owner::Package(pkg.name.clone()))
    }

    /// Kind from extension and path conventions.
    #[must_use]
    pub fn kind(&self, path: &str) -> FileKind {
        let components: Vec<&str> = path.split('/').collect();
        let Some((file_name, dirs)) = components.split_last() else {
            return FileKind::Other;
        };
        if *file_name == self.manifest_file {
            return FileKind::Other;
        }
        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext.to_ascii_lowercase()),
            _ => (*file_name, String::new()),
        };

        if SOURCE_EXTENSIONS.contains(&extension.as_str()) {
            let in_test_dir = dirs.iter().any(|d| is_test_directory(d));
            if in_test_dir || stem.ends_with("Tests") || stem.ends_with("Test") {
                FileKind::Test
            } else {
                FileKind::Source
            }
        } else if RESOURCE_EXTENSIONS.contains(&extension.as_str())
            || dirs.iter().any(|d| is_resource_directory(d))
        {
            FileKind::Resource
        } else {
            FileKind::Other
        }
    }

    /// Full classification of one path.
    #[must_use]
    pub fn classify(&self, path: &str) -> RepoFile {
        RepoFile::new(path, self.owner(path), self.kind(path))
    }
}

fn is_test_directory(name: &str) -> bool {
    TEST_DIRECTORIES.contains(&name) || name.ends_with("Tests")
}

fn is_resource_directory(name: &str) -> bool {
    name == "Resources" || RESOURCE_DIRECTORY_SUFFIXES.iter().any(|s| name.ends_with(s))
}
