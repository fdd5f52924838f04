//! Narration error types.

use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur while narrating.
///
/// None of these reach `speak()` callers; the orchestrator logs them and
/// falls back or goes silent. They surface only from the wiring
/// constructors and from the model-download helpers.
#[derive(Debug, thiserror::Error)]
pub enum NarrateError {
    /// Remote synthesis did not resolve within the latency budget.
    #[error("Remote synthesis timed out after {budget:?}")]
    Timeout { budget: Duration },

    /// Network-level failure talking to the remote endpoint.
    #[error("Remote synthesis transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status.
    #[error("Remote synthesis endpoint returned {0}")]
    ServerStatus(reqwest::StatusCode),

    /// Remote endpoint answered 2xx but the payload was unusable.
    #[error("Malformed remote synthesis response: {0}")]
    MalformedResponse(String),

    /// No on-device synthesis capability for the request.
    #[error("Local synthesis unavailable: {0}")]
    LocalUnavailable(String),

    /// Audio device or playback thread failure.
    #[error("Audio playback failed: {0}")]
    Playback(String),

    /// Voice model files missing at the expected path.
    #[error("Voice model not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Failed to fetch or unpack a voice model archive.
    #[error("Failed to download voice model '{name}': {source}")]
    ModelDownload { name: String, source: anyhow::Error },

    /// IO error (cache files, model directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
