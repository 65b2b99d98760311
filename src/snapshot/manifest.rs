//! Package descriptions: which files each importable module name stands for.
//!
//! Every package's manifest is described once per manifest content. The raw
//! JSON is cached under the control directory keyed by package name and the
//! SHA-256 of the manifest text, so an unchanged manifest never re-runs the
//! description tool.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{is_under, join_rel, standardize, FileKind, PackageManifest, RepoFile};
use crate::error::{Error, Result};
use crate::ports::{FileSystem, ManifestDescriber};
use crate::report::{Warning, Warnings};

/// Target types whose files can be imported by other code.
const IMPORTABLE_TARGET_TYPES: &[&str] = &["library", "regular"];

/// The subset of the description document the resolver reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageDescription {
    /// Declared package name, when present.
    #[serde(default)]
    pub name: Option<String>,
    /// Declared targets.
    #[serde(default)]
    pub targets: Vec<DescribedTarget>,
    /// Declared products.
    #[serde(default)]
    pub products: Vec<DescribedProduct>,
}

/// One target entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DescribedTarget {
    /// Module name.
    pub name: String,
    /// `library`, `executable`, `test`, ...
    #[serde(rename = "type", default)]
    pub target_type: String,
    /// Target directory relative to the package root.
    #[serde(default)]
    pub path: Option<String>,
    /// Source files or directories relative to the target directory.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Resources as bare paths or `{ "path": ... }` objects.
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

/// A resource declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResourceEntry {
    /// Bare path.
    Path(String),
    /// Object form; extra keys such as `rule` are ignored.
    Object {
        /// Resource path.
        path: String,
    },
}

impl ResourceEntry {
    fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Object { path } => path,
        }
    }
}

/// One product entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DescribedProduct {
    /// Product name.
    pub name: String,
    /// Targets the product vends.
    #[serde(default)]
    pub targets: Vec<String>,
}

impl PackageDescription {
    /// Parses the raw tool output.
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error if the JSON does not match the expected shape.
    pub fn from_json(raw: &str, package: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::parse(format!("package description for {package}"), e))
    }
}

/// Lowercase hex SHA-256 of `text`.
#[must_use]
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// On-disk store of raw description documents.
pub struct ManifestCache<'a> {
    fs: &'a dyn FileSystem,
    dir: PathBuf,
}

impl<'a> ManifestCache<'a> {
    /// Creates a cache rooted at `dir`.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, dir: PathBuf) -> Self {
        Self { fs, dir }
    }

    /// Path of the entry for `package` at manifest hash `hash`.
    #[must_use]
    pub fn entry_path(&self, package: &str, hash: &str) -> PathBuf {
        let safe: String = package
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}-{hash}.json"))
    }

    /// Cached raw description, if any.
    #[must_use]
    pub fn get(&self, package: &str, hash: &str) -> Option<String> {
        let path = self.entry_path(package, hash);
        if !self.fs.exists(&path) {
            return None;
        }
        match self.fs.read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(err) => {
                log::debug!("manifest cache entry unreadable: {err}");
                None
            }
        }
    }

    /// Stores a raw description.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the entry cannot be written.
    pub fn put(&self, package: &str, hash: &str, raw: &str) -> Result<()> {
        self.fs.write(&self.entry_path(package, hash), raw)
    }
}

/// Module or product name to the files it makes available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFileSet {
    modules: BTreeMap<String, BTreeSet<RepoFile>>,
    providers: BTreeMap<String, PackageManifest>,
}

impl ModuleFileSet {
    /// Files behind `name`, if registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BTreeSet<RepoFile>> {
        self.modules.get(name)
    }

    /// Package that registered `name`.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&str> {
        self.providers.get(name).map(|p| p.name.as_str())
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registers `name` for `package`. The first registration of a name
    /// wins; every later one is dropped with a warning.
    pub fn register(
        &mut self,
        name: &str,
        package: &PackageManifest,
        files: BTreeSet<RepoFile>,
        warnings: &mut Warnings,
    ) {
        if let Some(kept) = self.providers.get(name) {
            warnings.push(Warning::DuplicateProduct {
                name: name.to_string(),
                kept: package_label(kept),
                dropped: package_label(package),
            });
            return;
        }
        self.providers.insert(name.to_string(), package.clone());
        self.modules.insert(name.to_string(), files);
    }
}

/// Package name plus its root, so same-named packages stay distinguishable.
fn package_label(package: &PackageManifest) -> String {
    if package.root_path.is_empty() {
        format!("{} at the repository root", package.name)
    } else {
        format!("{} at {}", package.name, package.root_path)
    }
}

/// Describes packages and turns their declarations into a [`ModuleFileSet`].
pub struct ManifestResolver<'a> {
    /// Reads manifests for hashing.
    pub fs: &'a dyn FileSystem,
    /// Runs the description tool on cache misses.
    pub describer: &'a dyn ManifestDescriber,
    /// Raw description cache.
    pub cache: ManifestCache<'a>,
    /// Absolute repository root.
    pub repo_root: &'a Path,
    /// Manifest file name inside each package root.
    pub manifest_file: &'a str,
}

impl ManifestResolver<'_> {
    /// Resolves every package in name order.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable manifest, a failing description tool, or an
    /// unparsable description.
    pub fn resolve(
        &self,
        packages: &[PackageManifest],
        files: &[RepoFile],
        warnings: &mut Warnings,
    ) -> Result<ModuleFileSet> {
        let index: BTreeMap<&str, &RepoFile> = files.iter().map(|f| (f.path(), f)).collect();
        let mut ordered: Vec<&PackageManifest> = packages.iter().collect();
        ordered.sort();

        let mut modules = ModuleFileSet::default();
        for package in ordered {
            let description = self.describe(package)?;
            let contributed =
                package_modules(package, &description, &index, self.repo_root, warnings);
            for (name, module_files) in contributed {
                modules.register(&name, package, module_files, warnings);
            }
        }
        log::debug!("registered {} importable modules", modules.len());
        Ok(modules)
    }

    fn describe(&self, package: &PackageManifest) -> Result<PackageDescription> {
        let package_root = self.repo_root.join(&package.root_path);
        let manifest = self.fs.read_to_string(&package_root.join(self.manifest_file))?;
        let hash = content_hash(&manifest);

        if let Some(raw) = self.cache.get(&package.name, &hash) {
            match PackageDescription::from_json(&raw, &package.name) {
                Ok(description) => {
                    log::debug!("{}: manifest description cache hit", package.name);
                    return Ok(description);
                }
                Err(err) => log::warn!("{}: discarding cached description: {err}", package.name),
            }
        }

        log::info!("describing package {}", package.name);
        let raw = self.describer.describe(&package_root)?;
        let description = PackageDescription::from_json(&raw, &package.name)?;
        self.cache.put(&package.name, &hash, &raw)?;
        Ok(description)
    }
}

/// Modules one package contributes: its importable targets plus products
/// formed from them.
fn package_modules(
    package: &PackageManifest,
    description: &PackageDescription,
    index: &BTreeMap<&str, &RepoFile>,
    repo_root: &Path,
    warnings: &mut Warnings,
) -> BTreeMap<String, BTreeSet<RepoFile>> {
    let mut targets: BTreeMap<String, BTreeSet<RepoFile>> = BTreeMap::new();
    for target in &description.targets {
        if !IMPORTABLE_TARGET_TYPES.contains(&target.target_type.as_str()) {
            continue;
        }
        let default_path = format!("Sources/{}", target.name);
        let target_dir =
            join_rel(&package.root_path, target.path.as_deref().unwrap_or(&default_path));

        let mut files = BTreeSet::new();
        let mut declared: Vec<&str> = target.sources.iter().map(String::as_str).collect();
        declared.extend(target.resources.iter().map(ResourceEntry::path));
        if target.sources.is_empty() {
            files.extend(files_under(index, &target_dir));
        }
        for entry in declared {
            let Some(path) = declared_path(repo_root, &target_dir, entry) else {
                log::debug!("{}: {entry} is outside the repository", package.name);
                continue;
            };
            let found = files_under(index, &path);
            if found.is_empty() {
                warnings.push(Warning::MissingManifestEntry {
                    package: package.name.clone(),
                    path,
                });
            }
            files.extend(found);
        }
        targets.insert(target.name.clone(), files);
    }

    let mut modules = targets.clone();
    for product in &description.products {
        let union: BTreeSet<RepoFile> = product
            .targets
            .iter()
            .filter_map(|t| targets.get(t))
            .flat_map(|files| files.iter().cloned())
            .collect();
        if product.targets.iter().any(|t| targets.contains_key(t)) {
            modules.entry(product.name.clone()).or_default().extend(union);
        }
    }
    modules
}

/// Repo-relative form of a declared path; absolute paths must lie under the repo.
fn declared_path(repo_root: &Path, target_dir: &str, entry: &str) -> Option<String> {
    let path = if entry.starts_with('/') {
        let rel = Path::new(entry).strip_prefix(repo_root).ok()?;
        standardize(&rel.to_string_lossy())
    } else {
        join_rel(target_dir, entry)
    };
    (!path.starts_with("..")).then_some(path)
}

/// Source and resource files equal to or beneath `prefix`.
fn files_under(index: &BTreeMap<&str, &RepoFile>, prefix: &str) -> Vec<RepoFile> {
    index
        .range(prefix..)
        .take_while(|(path, _)| path.starts_with(prefix))
        .filter(|(path, _)| is_under(path, prefix))
        .filter(|(_, file)| matches!(file.kind(), FileKind::Source | FileKind::Resource))
        .map(|(_, file)| (*file).clone())
        .collect()
}
