//! Live VCS adapter using `git` CLI commands.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::ports::vcs::VcsRepo;
use crate::snapshot::classify::CONTROL_DIR;

/// Live VCS adapter that shells out to the `git` CLI.
pub struct LiveGitRepo;

/// Runs `git <args>` (optionally in `dir`) and returns trimmed stdout.
fn git(dir: Option<&Path>, args: &[&str]) -> Result<String> {
    let mut cmd = Command::new("git");
    if let Some(dir) = dir {
        cmd.arg("-C").arg(dir);
    }
    cmd.args(args);
    let command = format!("git {}", args.join(" "));

    let output = cmd
        .output()
        .map_err(|e| Error::Vcs { command: command.clone(), message: e.to_string() })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::Vcs { command, message: stderr });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

impl VcsRepo for LiveGitRepo {
    fn repo_root(&self) -> Result<PathBuf> {
        git(None, &["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    fn commit_hash(&self, root: &Path) -> Result<String> {
        // The tool's own artifacts never count as changes.
        let exclude = format!(":(exclude){CONTROL_DIR}");
        let status = git(Some(root), &["status", "--porcelain", "--", ".", &exclude])?;
        if !status.is_empty() {
            let changed = status.lines().count();
            return Err(Error::Vcs {
                command: "git status --porcelain".into(),
                message: format!("dirty working tree ({changed} changed paths)"),
            });
        }
        git(Some(root), &["rev-parse", "HEAD"])
    }
}
