//! Audio playback actor — keeps `!Send` playback resources off the async
//! runtime.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so [`RodioPlayback`]
//! never crosses threads: one OS thread owns it, and every operation
//! arrives as an [`AudioCommand`] over an `mpsc` channel (no
//! `unsafe impl Send/Sync` anywhere). The public [`AudioThreadHandle`]
//! is the `Send + Sync` proxy the narrator holds; it is the production
//! implementation of [`AudioOutput`].

use std::sync::mpsc;
use std::thread;

use crate::error::NarrateError;
use crate::output::{AudioClip, AudioOutput, PlaybackDoneCallback};
use crate::playback::RodioPlayback;

// ── Commands ───────────────────────────────────────────────────────

/// A command sent from the narrator to the audio thread.
enum AudioCommand {
    /// Decode and play a clip, replacing current playback.
    Play {
        clip: AudioClip,
        on_done: PlaybackDoneCallback,
        reply: mpsc::Sender<Result<(), NarrateError>>,
    },

    /// Stop any active playback immediately (fire-and-forget).
    Stop,

    /// Query whether audio is currently playing.
    IsPlaying { reply: mpsc::Sender<bool> },

    /// Shut down the audio thread, releasing the output stream.
    Shutdown,
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// `Send + Sync` handle to the dedicated audio thread.
///
/// All methods take `&self`; the underlying `mpsc::Sender` supports shared
/// access. Request/reply methods block the caller until the audio thread
/// responds, which is microseconds of local channel I/O plus the decode
/// probe itself.
pub struct AudioThreadHandle {
    cmd_tx: mpsc::Sender<AudioCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AudioThreadHandle {
    /// Spawn the audio thread, open the output device, and return the handle.
    ///
    /// Device errors are propagated back via a one-shot init channel, so a
    /// machine without audio output fails here rather than at first play.
    pub fn spawn() -> Result<Self, NarrateError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), NarrateError>>();

        let thread = thread::Builder::new()
            .name("vaani-audio".into())
            .spawn(move || Self::run(cmd_rx, init_tx))
            .map_err(|e| NarrateError::Playback(format!("failed to spawn audio thread: {e}")))?;

        // Wait for the audio thread to finish opening the device.
        init_rx.recv().map_err(|_| Self::thread_died())??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    // ── Command plumbing ───────────────────────────────────────────

    /// Send a command that expects a `Result<T, NarrateError>` reply and
    /// block until the audio thread responds. Channel failures mean the
    /// thread is gone and map to a playback error.
    fn send_and_recv<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<Result<T, NarrateError>>) -> AudioCommand,
    ) -> Result<T, NarrateError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx.send(build(tx)).map_err(|_| Self::thread_died())?;
        rx.recv().map_err(|_| Self::thread_died())?
    }

    /// Like `send_and_recv` but for queries returning a bare value.
    /// Returns `None` if the thread is dead.
    fn query<T>(&self, build: impl FnOnce(mpsc::Sender<T>) -> AudioCommand) -> Option<T> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx.send(build(tx)).ok()?;
        rx.recv().ok()
    }

    fn thread_died() -> NarrateError {
        NarrateError::Playback("audio thread is not running".to_string())
    }

    // ── Thread body ────────────────────────────────────────────────

    /// Body of the dedicated audio thread. Owns [`RodioPlayback`] for its
    /// entire lifetime; it never crosses a thread boundary.
    fn run(cmd_rx: mpsc::Receiver<AudioCommand>, init_tx: mpsc::Sender<Result<(), NarrateError>>) {
        let mut playback = match RodioPlayback::new() {
            Ok(playback) => playback,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };

        if init_tx.send(Ok(())).is_err() {
            // Caller dropped before init completed.
            return;
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::Play {
                    clip,
                    on_done,
                    reply,
                } => {
                    let _ = reply.send(playback.play(clip, on_done));
                }

                AudioCommand::Stop => playback.stop(),

                AudioCommand::IsPlaying { reply } => {
                    let _ = reply.send(playback.is_playing());
                }

                AudioCommand::Shutdown => break,
            }
        }

        // `playback` is dropped here, on the audio thread.
        tracing::debug!("audio thread shutting down");
    }
}

impl AudioOutput for AudioThreadHandle {
    fn play(&self, clip: AudioClip, on_done: PlaybackDoneCallback) -> Result<(), NarrateError> {
        self.send_and_recv(|reply| AudioCommand::Play {
            clip,
            on_done,
            reply,
        })
    }

    fn stop(&self) {
        let _ = self.cmd_tx.send(AudioCommand::Stop);
    }

    fn is_playing(&self) -> bool {
        self.query(|reply| AudioCommand::IsPlaying { reply })
            .unwrap_or(false)
    }
}

impl Drop for AudioThreadHandle {
    fn drop(&mut self) {
        // Best-effort shutdown; the thread may already be dead.
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
