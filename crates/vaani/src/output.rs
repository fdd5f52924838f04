//! Playback seam between the orchestrator and the audio device.

use crate::error::NarrateError;

/// Callback fired when a clip drains to completion on its own.
pub type PlaybackDoneCallback = Box<dyn FnOnce() + Send + 'static>;

/// One playable audio payload.
#[derive(Debug, Clone)]
pub enum AudioClip {
    /// Container-encoded bytes (mp3/wav) as fetched from the remote service.
    Encoded(Vec<u8>),
    /// Mono PCM as produced by on-device synthesis.
    Pcm { samples: Vec<f32>, sample_rate: u32 },
}

/// Audio output abstraction the orchestrator plays both channels through.
///
/// Contract:
/// - `play` stops whatever is currently audible before starting the new
///   clip, so at most one clip is ever live at an instant;
/// - `on_done` fires exactly once on natural completion and never after
///   `stop`;
/// - `stop` is idempotent.
pub trait AudioOutput: Send + Sync {
    /// Decode and start the clip, replacing any current playback.
    fn play(&self, clip: AudioClip, on_done: PlaybackDoneCallback) -> Result<(), NarrateError>;

    /// Silence whatever is playing, immediately.
    fn stop(&self);

    /// Whether audio is currently audible.
    fn is_playing(&self) -> bool;
}
