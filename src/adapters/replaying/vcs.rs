//! Replaying adapter for the `VcsRepo` port.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::cassette::replayer::{replay_result, CassetteReplayer};
use crate::error::{Error, Result};
use crate::ports::vcs::VcsRepo;

/// Replays recorded version-control answers from a cassette.
pub struct ReplayingVcsRepo {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingVcsRepo {
    /// Creates a new replaying VCS adapter from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn next(&self, method: &str) -> serde_json::Value {
        self.replayer.lock().expect("replayer lock poisoned").next_interaction("vcs", method).output
    }
}

fn recorded_vcs_error(command: &'static str) -> impl FnOnce(String) -> Error {
    move |message| Error::Vcs { command: command.to_string(), message }
}

impl VcsRepo for ReplayingVcsRepo {
    fn repo_root(&self) -> Result<PathBuf> {
        let output = self.next("repo_root");
        let on_err = recorded_vcs_error("git rev-parse --show-toplevel");
        replay_result(&output, "vcs::repo_root", on_err)
    }

    fn commit_hash(&self, _root: &Path) -> Result<String> {
        let output = self.next("commit_hash");
        replay_result(&output, "vcs::commit_hash", recorded_vcs_error("git rev-parse HEAD"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn make_replayer(interactions: Vec<Interaction>) -> CassetteReplayer {
        CassetteReplayer::new(&Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions,
        })
    }

    #[test]
    fn replays_root_and_commit() {
        let vcs = ReplayingVcsRepo::new(make_replayer(vec![
            Interaction {
                seq: 0,
                port: "vcs".into(),
                method: "repo_root".into(),
                input: json!({}),
                output: json!({"ok": "/work/repo"}),
            },
            Interaction {
                seq: 1,
                port: "vcs".into(),
                method: "commit_hash".into(),
                input: json!({"path": "/work/repo"}),
                output: json!({"ok": "abc123def"}),
            },
        ]));
        let root = vcs.repo_root().unwrap();
        assert_eq!(root, PathBuf::from("/work/repo"));
        assert_eq!(vcs.commit_hash(&root).unwrap(), "abc123def");
    }

    #[test]
    fn replays_dirty_tree_as_vcs_error() {
        let vcs = ReplayingVcsRepo::new(make_replayer(vec![Interaction {
            seq: 0,
            port: "vcs".into(),
            method: "commit_hash".into(),
            input: json!({"path": "/work/repo"}),
            output: json!({"err": "dirty working tree (2 changed paths)"}),
        }]));
        let err = vcs.commit_hash(Path::new("/work/repo")).unwrap_err();
        assert!(matches!(err, Error::Vcs { .. }));
        assert!(err.to_string().contains("dirty working tree"));
    }
}
