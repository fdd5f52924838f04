//! Clip playback via `rodio`.
//!
//! Owns the output stream and at most one live sink. Runs on the
//! dedicated audio thread (see [`crate::audio_thread`]) because
//! `rodio::OutputStream` is `!Send` on some platforms.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::error::NarrateError;
use crate::output::{AudioClip, PlaybackDoneCallback};

/// The live sink plus its watcher guard.
///
/// The guard is scoped to this one sink: `stop()` flips only the current
/// sink's flag, so a watcher belonging to an older sink can never fire its
/// callback after playback has been restarted.
struct ActiveSink {
    sink: Arc<Sink>,
    live: Arc<AtomicBool>,
}

/// Audio playback over the default output device.
pub struct RodioPlayback {
    /// Keeps the rodio output stream alive for the playback lifetime.
    _stream: OutputStream,

    /// Sink factory for the output device.
    stream_handle: OutputStreamHandle,

    /// Current playback sink, if any.
    active: Option<ActiveSink>,
}

impl RodioPlayback {
    /// Open the default output device.
    pub fn new() -> Result<Self, NarrateError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| NarrateError::Playback(format!("no audio output device: {e}")))?;

        tracing::info!("audio playback initialized on default output device");

        Ok(Self {
            _stream: stream,
            stream_handle,
            active: None,
        })
    }

    /// Decode and play a clip, stopping any current playback first.
    ///
    /// Encoded clips are probed eagerly, so an unusable payload surfaces
    /// here as an error rather than as silence. `on_done` fires when the
    /// sink drains naturally; an explicit [`stop`](Self::stop) suppresses it.
    pub fn play(
        &mut self,
        clip: AudioClip,
        on_done: PlaybackDoneCallback,
    ) -> Result<(), NarrateError> {
        self.stop();

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| NarrateError::Playback(format!("failed to open playback sink: {e}")))?;

        match clip {
            AudioClip::Encoded(bytes) => {
                let size = bytes.len();
                let source = Decoder::new(Cursor::new(bytes)).map_err(|e| {
                    NarrateError::MalformedResponse(format!("undecodable audio clip: {e}"))
                })?;
                sink.append(source);
                tracing::debug!(bytes = size, "encoded clip queued");
            }
            AudioClip::Pcm {
                samples,
                sample_rate,
            } => {
                tracing::debug!(samples = samples.len(), sample_rate, "pcm clip queued");
                sink.append(rodio::buffer::SamplesBuffer::new(1, sample_rate, samples));
            }
        }

        let sink = Arc::new(sink);
        let live = Arc::new(AtomicBool::new(true));
        Self::spawn_completion_watcher(Arc::clone(&sink), Arc::clone(&live), on_done);
        self.active = Some(ActiveSink { sink, live });

        Ok(())
    }

    /// Background thread that blocks until the sink drains or is stopped.
    ///
    /// `Sink` is Send in rodio 0.20+, so it can move into the thread.
    /// `sleep_until_end()` returns immediately once `stop()` drops the
    /// queued sources.
    fn spawn_completion_watcher(
        sink: Arc<Sink>,
        live: Arc<AtomicBool>,
        on_done: PlaybackDoneCallback,
    ) {
        std::thread::spawn(move || {
            sink.sleep_until_end();

            // stop() already claimed this sink: the callback must not fire.
            if !live.swap(false, Ordering::SeqCst) {
                return;
            }

            tracing::debug!("playback finished naturally");
            on_done();
        });
    }

    /// Stop any active playback immediately. Idempotent.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.live.store(false, Ordering::SeqCst);
            active.sink.stop();
            tracing::debug!("playback stopped");
        }
    }

    /// Whether audio is currently playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.active.as_ref().is_some_and(|active| !active.sink.empty())
    }
}
