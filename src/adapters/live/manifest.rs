//! Live manifest describer that runs the package description tool.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::ports::manifest::ManifestDescriber;

/// Default description command for Swift packages.
pub const DEFAULT_DESCRIBE_COMMAND: &str = "swift package describe --type json";

/// Runs a configured command line in the package root and returns its stdout.
pub struct LiveManifestDescriber {
    program: String,
    args: Vec<String>,
}

impl LiveManifestDescriber {
    /// Creates a describer from a whitespace-separated command line.
    ///
    /// An empty command line falls back to [`DEFAULT_DESCRIBE_COMMAND`].
    #[must_use]
    pub fn new(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(String::from);
        match parts.next() {
            Some(program) => Self { program, args: parts.collect() },
            None => Self::new(DEFAULT_DESCRIBE_COMMAND),
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for LiveManifestDescriber {
    fn default() -> Self {
        Self::new(DEFAULT_DESCRIBE_COMMAND)
    }
}

impl ManifestDescriber for LiveManifestDescriber {
    fn describe(&self, package_root: &Path) -> Result<String> {
        log::debug!("describing package at {}", package_root.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(package_root)
            .output()
            .map_err(|e| Error::ManifestTool {
                command: self.command_line(),
                directory: package_root.to_path_buf(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::ManifestTool {
                command: self.command_line(),
                directory: package_root.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn returns_stdout_of_command() {
        let dir = tempfile::tempdir().unwrap();
        let describer = LiveManifestDescriber::new("echo {\"targets\":[]}");
        let out = describer.describe(dir.path()).unwrap();
        assert_eq!(out.trim(), "{\"targets\":[]}");
    }

    #[test]
    fn non_zero_exit_is_manifest_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let describer = LiveManifestDescriber::new("false");
        let err = describer.describe(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestTool { ref command, .. } if command == "false"));
    }

    #[test]
    fn empty_command_line_uses_default() {
        assert_eq!(LiveManifestDescriber::new("  ").command_line(), DEFAULT_DESCRIBE_COMMAND);
    }
}
