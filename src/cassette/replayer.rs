//! Serves recorded interactions back in order.

use std::collections::{BTreeMap, VecDeque};

use serde::de::DeserializeOwned;

use super::format::{Cassette, Interaction};
use crate::error::{Error, Result};

/// Per (port, method) queues over a loaded cassette.
///
/// Calls on different ports interleave freely; calls on the same port and
/// method are served in recorded order.
pub struct CassetteReplayer {
    queues: BTreeMap<(String, String), VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Indexes `cassette` for replay.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: BTreeMap<(String, String), VecDeque<Interaction>> = BTreeMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.clone());
        }
        Self { queues }
    }

    /// Pops the next interaction for `port`/`method`.
    ///
    /// # Panics
    ///
    /// Panics when the cassette has no (more) interactions for the pair,
    /// listing what it does have. Replay is a test surface; a mismatch means
    /// the cassette and the code under test disagree.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Interaction {
        let key = (port.to_string(), method.to_string());
        let Some(queue) = self.queues.get_mut(&key) else {
            let available: Vec<String> =
                self.queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            panic!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            );
        };
        queue.pop_front().unwrap_or_else(|| {
            panic!(
                "Cassette exhausted: all interactions for port={port:?} method={method:?} \
                 have been consumed"
            )
        })
    }
}

/// Decodes a fallible interaction output.
///
/// `{"err": msg}` becomes the error built by `on_err`; `{"ok": v}` (or a bare
/// value) is deserialized into `T`.
///
/// # Errors
///
/// Returns `on_err(msg)` for recorded failures and a `Parse` error when the
/// recorded value does not fit `T`.
pub fn replay_result<T, F>(output: &serde_json::Value, context: &str, on_err: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce(String) -> Error,
{
    if let Some(err) = output.get("err") {
        return Err(on_err(err.as_str().unwrap_or("unknown error").to_string()));
    }
    let value = output.get("ok").unwrap_or(output);
    serde_json::from_value(value.clone()).map_err(|e| Error::parse(context, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, port: &str, method: &str, output: serde_json::Value) -> Interaction {
        Interaction {
            seq,
            port: port.into(),
            method: method.into(),
            input: json!({}),
            output,
        }
    }

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions,
        }
    }

    #[test]
    fn serves_each_port_method_in_recorded_order() {
        let cassette = make_cassette(vec![
            interaction(0, "manifest", "describe", json!({"ok": "A"})),
            interaction(1, "clock", "now", json!("2025-01-01T00:00:00Z")),
            interaction(2, "manifest", "describe", json!({"ok": "B"})),
        ]);
        let mut replayer = CassetteReplayer::new(&cassette);

        assert_eq!(replayer.next_interaction("clock", "now").seq, 1);
        assert_eq!(replayer.next_interaction("manifest", "describe").seq, 0);
        assert_eq!(replayer.next_interaction("manifest", "describe").seq, 2);
    }

    #[test]
    #[should_panic(expected = "Cassette exhausted")]
    fn exhausted_queue_panics() {
        let cassette = make_cassette(vec![interaction(0, "vcs", "repo_root", json!({}))]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("vcs", "repo_root");
        let _ = replayer.next_interaction("vcs", "repo_root");
    }

    #[test]
    #[should_panic(expected = "no interactions recorded")]
    fn unknown_port_panics() {
        let mut replayer = CassetteReplayer::new(&make_cassette(vec![]));
        let _ = replayer.next_interaction("unknown", "method");
    }

    #[test]
    fn replay_result_decodes_ok_and_err() {
        let ok: String =
            replay_result(&json!({"ok": "hash"}), "vcs::commit_hash", Error::validation).unwrap();
        assert_eq!(ok, "hash");

        let bare: String = replay_result(&json!("bare"), "ctx", Error::validation).unwrap();
        assert_eq!(bare, "bare");

        let err = replay_result::<String, _>(&json!({"err": "boom"}), "ctx", Error::validation)
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
