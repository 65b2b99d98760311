//! Recording adapters that capture interactions to cassettes.

pub mod clock;
pub mod manifest;
pub mod vcs;

pub use clock::RecordingClock;
pub use manifest::RecordingManifestDescriber;
pub use vcs::RecordingVcsRepo;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

/// Records an infallible call.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    let input_json = serde_json::to_value(input).unwrap_or(serde_json::Value::Null);
    let output_json = serde_json::to_value(output).unwrap_or(serde_json::Value::Null);
    recorder.lock().expect("recorder lock poisoned").record(port, method, input_json, output_json);
}

/// Records a fallible call as `{"ok": value}` or `{"err": message}`.
///
/// This is the shape [`replay_result`](crate::cassette::replayer::replay_result) reads back.
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let output = match result {
        Ok(v) => {
            let inner = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
            serde_json::json!({ "ok": inner })
        }
        Err(e) => serde_json::json!({ "err": e.to_string() }),
    };
    record_interaction(recorder, port, method, input, &output);
}

/// Input shape for calls that take a single path.
#[derive(Serialize)]
pub(crate) struct PathInput {
    pub(crate) path: String,
}

impl PathInput {
    pub(crate) fn new(path: &std::path::Path) -> Self {
        Self { path: path.display().to_string() }
    }
}
