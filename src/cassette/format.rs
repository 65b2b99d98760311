//! Cassette data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded call on a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number within the cassette.
    pub seq: u64,
    /// Port name: `clock`, `vcs` or `manifest`.
    pub port: String,
    /// Method invoked on the port.
    pub method: String,
    /// Call arguments.
    pub input: serde_json::Value,
    /// Returned value. Fallible methods use `{"ok": v}` / `{"err": msg}`.
    pub output: serde_json::Value,
}

/// A named, ordered list of interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the cassette was written.
    pub recorded_at: DateTime<Utc>,
    /// Commit of the repository being recorded, or `unknown`.
    pub commit: String,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Parses a cassette from YAML.
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error naming `origin` when the YAML is malformed.
    pub fn from_yaml(yaml: &str, origin: &str) -> crate::error::Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| crate::error::Error::parse(origin, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hand_written_cassette() {
        let yaml = r#"
name: snapshot-app
recorded_at: 2025-03-01T12:00:00Z
commit: abc123
interactions:
  - seq: 0
    port: vcs
    method: repo_root
    input: {}
    output: {ok: /work/repo}
  - seq: 1
    port: manifest
    method: describe
    input: {path: /work/repo/Core}
    output: {err: "error: no Package.swift"}
"#;
        let cassette = Cassette::from_yaml(yaml, "inline").unwrap();
        assert_eq!(cassette.commit, "abc123");
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].output, json!({"ok": "/work/repo"}));
        assert_eq!(cassette.interactions[1].port, "manifest");
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = Cassette::from_yaml("interactions: [", "broken.yaml").unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
