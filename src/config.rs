//! Optional `.repoflat/config.yaml` plus environment overrides.
//!
//! Precedence for every setting: CLI flag, then environment, then the config
//! file, then the built-in default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ports::FileSystem;
use crate::snapshot::classify::CONTROL_DIR;
use crate::snapshot::TargetSpec;

/// Config file name inside the control directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Manifest file marking a package root unless configured otherwise.
pub const DEFAULT_MANIFEST_FILE: &str = "Package.swift";

/// Overrides the flatten/prune destination.
pub const ENV_DESTINATION: &str = "REPOFLAT_DESTINATION";

/// Overrides the package description command line.
pub const ENV_MANIFEST_TOOL: &str = "REPOFLAT_MANIFEST_TOOL";

/// Directory to record port interactions into.
pub const ENV_RECORD: &str = "REPOFLAT_RECORD";

/// Project settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Targets snapshotted when none are given on the command line.
    pub targets: Vec<TargetSpec>,
    /// Flatten destination.
    pub destination: Option<PathBuf>,
    /// Extra ignore patterns on top of `.gitignore`.
    pub ignore: Vec<String>,
    /// Manifest file name; defaults to [`DEFAULT_MANIFEST_FILE`].
    pub manifest_file: Option<String>,
}

impl Config {
    /// Location of the config file for a repository.
    #[must_use]
    pub fn path(repo_root: &Path) -> PathBuf {
        repo_root.join(CONTROL_DIR).join(CONFIG_FILE)
    }

    /// Loads the config file if present, then applies process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an `Io` or `Parse` error for an unreadable or malformed file.
    pub fn load(fs: &dyn FileSystem, repo_root: &Path) -> Result<Self> {
        let path = Self::path(repo_root);
        let config = if fs.exists(&path) {
            log::debug!("loading config from {}", path.display());
            Self::from_yaml(&fs.read_to_string(&path)?, &path)?
        } else {
            Self::default()
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Parses YAML config text.
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error naming `origin`.
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self =
            serde_yaml::from_str(text).map_err(|e| Error::parse(origin.display().to_string(), e))?;
        for target in &mut config.targets {
            target.entry_folder = crate::snapshot::standardize(&target.entry_folder);
        }
        Ok(config)
    }

    /// Applies environment overrides through `lookup`.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(destination) = lookup(ENV_DESTINATION).filter(|v| !v.trim().is_empty()) {
            self.destination = Some(PathBuf::from(destination));
        }
        self
    }

    /// Manifest file name in effect.
    #[must_use]
    pub fn manifest_file(&self) -> &str {
        self.manifest_file.as_deref().unwrap_or(DEFAULT_MANIFEST_FILE)
    }

    /// Config targets with command-line targets layered on top, sorted by name.
    ///
    /// A command-line target replaces the config target of the same name.
    #[must_use]
    pub fn merged_targets(&self, cli: &[TargetSpec]) -> Vec<TargetSpec> {
        let mut targets: Vec<TargetSpec> = self
            .targets
            .iter()
            .filter(|t| !cli.iter().any(|c| c.name == t.name))
            .cloned()
            .collect();
        targets.extend(cli.iter().cloned());
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        targets
    }

    /// Destination in effect given an optional command-line value.
    #[must_use]
    pub fn destination(&self, cli: Option<&Path>) -> Option<PathBuf> {
        cli.map(Path::to_path_buf).or_else(|| self.destination.clone())
    }
}

/// Description command line from the environment, if set.
#[must_use]
pub fn manifest_tool_from_env() -> Option<String> {
    std::env::var(ENV_MANIFEST_TOOL).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::LiveFileSystem;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = "\
targets:
  - name: App
    entryFolder: ./App/
  - name: Widget
    entryFolder: Extensions/Widget
destination: /tmp/out
ignore:
  - Pods/
manifestFile: Package.swift
";
        let config = Config::from_yaml(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(config.targets[0].entry_folder, "App");
        assert_eq!(config.destination, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.ignore, vec!["Pods/".to_string()]);
        assert_eq!(config.manifest_file(), "Package.swift");
    }

    #[test]
    fn unknown_shape_is_a_parse_error() {
        let err = Config::from_yaml("targets: 3", Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let config = Config { destination: Some("/from/file".into()), ..Config::default() };
        let config = config.with_env(|key| (key == ENV_DESTINATION).then(|| "/from/env".into()));
        assert_eq!(config.destination(None), Some(PathBuf::from("/from/env")));
        assert_eq!(
            config.destination(Some(Path::new("/from/cli"))),
            Some(PathBuf::from("/from/cli"))
        );
    }

    #[test]
    fn cli_targets_replace_config_targets_by_name() {
        let config = Config {
            targets: vec![
                TargetSpec { name: "Widget".into(), entry_folder: "Widget".into() },
                TargetSpec { name: "App".into(), entry_folder: "Old".into() },
            ],
            ..Config::default()
        };
        let merged = config.merged_targets(&[TargetSpec::parse("App=App").unwrap()]);
        assert_eq!(
            merged,
            vec![
                TargetSpec { name: "App".into(), entry_folder: "App".into() },
                TargetSpec { name: "Widget".into(), entry_folder: "Widget".into() },
            ]
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&LiveFileSystem, dir.path()).unwrap();
        assert!(config.targets.is_empty());
        assert_eq!(config.manifest_file(), DEFAULT_MANIFEST_FILE);
    }
}
