//! Narrator configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default remote synthesis endpoint (the app backend's TTS route).
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/tts/generate/";

/// Default end-to-end latency budget for the remote channel.
///
/// Focus-driven narration is only useful if it starts promptly; past this
/// bound the orchestrator abandons the remote attempt and synthesizes
/// on-device instead.
pub const DEFAULT_LATENCY_BUDGET: Duration = Duration::from_millis(2000);

/// Remote synthesis channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Synthesis endpoint URL (POST target).
    pub endpoint: String,
    /// Budget for the whole remote attempt, request through clip bytes.
    pub latency_budget: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            latency_budget: DEFAULT_LATENCY_BUDGET,
        }
    }
}

/// On-device synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Root directory holding downloaded voice models.
    /// `None` resolves to [`default_model_dir`].
    pub model_dir: Option<PathBuf>,
    /// Speech speed multiplier (1.0 = natural pace).
    pub speed: f32,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            speed: 1.0,
        }
    }
}

/// Top-level narrator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    pub remote: RemoteConfig,
    pub local: LocalConfig,
    /// Directory for the on-disk clip cache. `None` disables caching.
    pub cache_dir: Option<PathBuf>,
}

/// Platform-appropriate clip cache directory (`<cache>/vaani/tts`).
#[must_use]
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("vaani").join("tts"))
}

/// Platform-appropriate voice model directory (`<data>/vaani/voice_models`).
#[must_use]
pub fn default_model_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("vaani").join("voice_models"))
}
