//! Narration orchestrator — per-call lifecycle for remote-first speech.
//!
//! Each `speak()` call runs the same decision ladder:
//!
//! ```text
//!   speak(text, language)
//!       │ empty text? → return (current playback untouched)
//!       │ stop current playback, supersede older calls
//!       ▼
//!   AttemptingRemote ──clip within budget──▶ PlayingRemote ──▶ Idle
//!       │ timeout / error / bad clip
//!       │ (session degraded permanently)
//!       ▼
//!   AttemptingLocal ──synthesized──▶ PlayingLocal ──▶ Idle
//!       │ unavailable
//!       ▼
//!     Idle (silence, logged)
//! ```
//!
//! A degraded session skips straight to `AttemptingLocal` on every later
//! call. Nothing here returns errors to the caller: narration is
//! best-effort accessibility, and every failure resolves internally to a
//! fallback or to silence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::audio_thread::AudioThreadHandle;
use crate::cache::AudioCache;
use crate::config::NarratorConfig;
use crate::error::NarrateError;
use crate::health::SessionHealth;
use crate::language::Language;
use crate::output::{AudioClip, AudioOutput};
use crate::synth::remote::HttpSynthesizer;
use crate::synth::{LocalSynthesizer, RemoteSynthesizer};

// ── Narration state machine ────────────────────────────────────────

/// Current state of the narrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarratorState {
    /// Nothing in flight, nothing audible.
    Idle,

    /// Remote request in flight, latency budget running.
    AttemptingRemote,

    /// Playing a remote clip.
    PlayingRemote,

    /// On-device synthesis in progress.
    AttemptingLocal,

    /// Playing an on-device clip.
    PlayingLocal,
}

/// Which channel produced the audible clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechChannel {
    Remote,
    Local,
}

// ── Events emitted by the narrator ─────────────────────────────────

/// Events emitted to the UI / application layer.
///
/// There is deliberately no failure event: failures are logged and
/// resolved internally (fallback or silence), never surfaced to callers.
#[derive(Debug, Clone)]
pub enum NarratorEvent {
    /// Narrator state changed.
    StateChanged(NarratorState),

    /// Audio started playing.
    NarrationStarted { channel: SpeechChannel },

    /// Audio finished naturally (not via `stop()`).
    NarrationFinished,
}

// ── Shared internals ───────────────────────────────────────────────

/// State shared between the narrator and the tasks it spawns.
struct NarratorShared {
    /// Monotonic id of the most recent `speak()`/`stop()` call. Work
    /// belonging to an older generation is stale and must not start audio
    /// or transition state.
    generation: AtomicU64,

    /// Current state; written only while `play_lock` is held.
    state: Mutex<NarratorState>,

    /// Serializes supersession (generation bump + teardown) against
    /// check-then-play sections. Held only for synchronous work, never
    /// across an await.
    play_lock: Mutex<()>,

    event_tx: mpsc::UnboundedSender<NarratorEvent>,
}

impl NarratorShared {
    fn lock_play(&self) -> MutexGuard<'_, ()> {
        self.play_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Move to `new_state`, emitting a change event when it differs.
    fn set_state(&self, new_state: NarratorState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != new_state {
            tracing::debug!(old = ?*state, new = ?new_state, "narrator state transition");
            *state = new_state;
            drop(state);
            self.emit(NarratorEvent::StateChanged(new_state));
        }
    }

    /// Transition state only if `generation` is still the latest call.
    /// Returns whether the calling task should keep going.
    fn set_state_if_current(&self, generation: u64, new_state: NarratorState) -> bool {
        let _guard = self.lock_play();
        if !self.is_current(generation) {
            return false;
        }
        self.set_state(new_state);
        true
    }

    /// Natural-completion callback body: emit the finish event and return
    /// to idle, unless a newer call has taken over in the meantime.
    fn finish_if_current(&self, generation: u64) {
        let _guard = self.lock_play();
        if !self.is_current(generation) {
            return;
        }
        self.emit(NarratorEvent::NarrationFinished);
        self.set_state(NarratorState::Idle);
    }

    /// Emit an event, best-effort.
    fn emit(&self, event: NarratorEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("narrator event receiver dropped");
        }
    }
}

// ── Narrator ───────────────────────────────────────────────────────

/// The narration orchestrator.
///
/// Owns the per-call lifecycle: cancel-in-flight, the budgeted remote
/// attempt, the fallback decision, on-device synthesis, and playback
/// state reporting. Collaborators are injected as trait objects so tests
/// (and alternative deployments) can substitute any of them.
pub struct Narrator {
    remote: Arc<dyn RemoteSynthesizer>,
    local: Arc<dyn LocalSynthesizer>,
    output: Arc<dyn AudioOutput>,
    health: SessionHealth,
    shared: Arc<NarratorShared>,
    latency_budget: Duration,
    runtime: Handle,
}

impl Narrator {
    /// Create a narrator from explicit collaborators.
    ///
    /// Must be called inside a Tokio runtime; narration tasks spawn onto
    /// it. Returns the narrator and a receiver for [`NarratorEvent`]s.
    #[must_use]
    pub fn new(
        config: &NarratorConfig,
        remote: Arc<dyn RemoteSynthesizer>,
        local: Arc<dyn LocalSynthesizer>,
        output: Arc<dyn AudioOutput>,
        health: SessionHealth,
    ) -> (Self, mpsc::UnboundedReceiver<NarratorEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let narrator = Self {
            remote,
            local,
            output,
            health,
            shared: Arc::new(NarratorShared {
                generation: AtomicU64::new(0),
                state: Mutex::new(NarratorState::Idle),
                play_lock: Mutex::new(()),
                event_tx,
            }),
            latency_budget: config.remote.latency_budget,
            runtime: Handle::current(),
        };

        (narrator, event_rx)
    }

    /// Create a narrator with the production collaborator set: the HTTP
    /// synthesis client (with clip cache when `cache_dir` is set), the
    /// on-device backend when one can load, the dedicated audio thread,
    /// and a fresh session.
    pub fn with_defaults(
        config: NarratorConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<NarratorEvent>), NarrateError> {
        let cache = config.cache_dir.clone().map(AudioCache::new);
        let remote = Arc::new(HttpSynthesizer::new(&config.remote, cache)?);
        let local = default_local_synthesizer(&config);
        let output = Arc::new(AudioThreadHandle::spawn()?);
        let health = SessionHealth::new();

        Ok(Self::new(&config, remote, local, output, health))
    }

    /// Current narrator state.
    #[must_use]
    pub fn state(&self) -> NarratorState {
        *self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether audio is currently audible.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.output.is_playing()
    }

    /// Clone of the shared session health flag.
    #[must_use]
    pub fn health(&self) -> SessionHealth {
        self.health.clone()
    }

    /// Narrate `text` in `language`. Fire-and-forget.
    ///
    /// Empty (or whitespace-only) text returns immediately without
    /// touching current playback. Otherwise any current narration is
    /// stopped synchronously, older in-flight calls are superseded, and
    /// the request resolves in the background: remote synthesis within
    /// the latency budget first (unless the session is already degraded),
    /// then on-device synthesis, then silence.
    ///
    /// The caller learns about progress through the event channel; no
    /// failure is ever reported back from this method.
    pub fn speak(&self, text: &str, language: Language) {
        if text.trim().is_empty() {
            tracing::debug!("ignoring empty narration request");
            return;
        }

        // Teardown happens before any suspension point so rapid
        // successive calls never overlap audio and an older call's
        // eventual response is provably stale.
        let generation = {
            let _guard = self.shared.lock_play();
            let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            self.output.stop();
            self.shared.set_state(if self.health.is_unavailable() {
                NarratorState::AttemptingLocal
            } else {
                NarratorState::AttemptingRemote
            });
            generation
        };

        tracing::debug!(text_len = text.len(), %language, generation, "narration requested");

        let task = SpeakTask {
            remote: Arc::clone(&self.remote),
            local: Arc::clone(&self.local),
            output: Arc::clone(&self.output),
            health: self.health.clone(),
            shared: Arc::clone(&self.shared),
            budget: self.latency_budget,
            generation,
            text: text.to_string(),
            language,
        };
        self.runtime.spawn(task.run());
    }

    /// Stop any active narration immediately and return to idle.
    ///
    /// Supersedes in-flight work at its next checkpoint. Idempotent when
    /// nothing is playing. Emits no `NarrationFinished` (that event means
    /// natural completion).
    pub fn stop(&self) {
        let _guard = self.shared.lock_play();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.output.stop();
        self.shared.set_state(NarratorState::Idle);
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Production local backend: sherpa when models are present, otherwise a
/// null backend so the fallback path degrades to silence.
#[cfg(feature = "sherpa")]
fn default_local_synthesizer(config: &NarratorConfig) -> Arc<dyn LocalSynthesizer> {
    let model_root = config
        .local
        .model_dir
        .clone()
        .or_else(crate::config::default_model_dir);

    if let Some(root) = model_root {
        match crate::synth::sherpa::SherpaSynthesizer::load(&root, &config.local) {
            Ok(synth) => return Arc::new(synth),
            Err(e) => tracing::warn!(error = %e, "on-device synthesis disabled"),
        }
    }
    Arc::new(crate::synth::NullSynthesizer)
}

#[cfg(not(feature = "sherpa"))]
fn default_local_synthesizer(_config: &NarratorConfig) -> Arc<dyn LocalSynthesizer> {
    Arc::new(crate::synth::NullSynthesizer)
}

// ── Speak task ─────────────────────────────────────────────────────

/// Everything one narration needs after `speak()` returns.
struct SpeakTask {
    remote: Arc<dyn RemoteSynthesizer>,
    local: Arc<dyn LocalSynthesizer>,
    output: Arc<dyn AudioOutput>,
    health: SessionHealth,
    shared: Arc<NarratorShared>,
    budget: Duration,
    generation: u64,
    text: String,
    language: Language,
}

enum PlayOutcome {
    Started,
    Superseded,
    Failed(NarrateError),
}

impl SpeakTask {
    async fn run(self) {
        if self.health.is_unavailable() {
            tracing::debug!("session degraded, skipping remote synthesis");
        } else {
            // The timeout drops the request future on expiry: the
            // in-flight request is truly cancelled, not awaited.
            match tokio::time::timeout(
                self.budget,
                self.remote.synthesize(&self.text, self.language),
            )
            .await
            {
                Ok(Ok(clip)) => {
                    match self.start_playback(
                        AudioClip::Encoded(clip.bytes),
                        NarratorState::PlayingRemote,
                        SpeechChannel::Remote,
                    ) {
                        PlayOutcome::Started | PlayOutcome::Superseded => return,
                        PlayOutcome::Failed(e) => {
                            // An undecodable clip is a remote failure like
                            // any other: degrade and fall back.
                            tracing::warn!(error = %e, "remote clip failed to start");
                        }
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "remote synthesis failed");
                }
                Err(_) => {
                    let e = NarrateError::Timeout { budget: self.budget };
                    tracing::warn!(error = %e, "remote synthesis abandoned");
                }
            }
            self.health.mark_unavailable();
        }

        if !self
            .shared
            .set_state_if_current(self.generation, NarratorState::AttemptingLocal)
        {
            return;
        }

        match self.local.synthesize(&self.text, self.language).await {
            Ok(clip) => {
                let outcome = self.start_playback(
                    AudioClip::Pcm {
                        samples: clip.samples,
                        sample_rate: clip.sample_rate,
                    },
                    NarratorState::PlayingLocal,
                    SpeechChannel::Local,
                );
                if let PlayOutcome::Failed(e) = outcome {
                    tracing::warn!(error = %e, "local clip failed to start, narration dropped");
                    self.shared
                        .set_state_if_current(self.generation, NarratorState::Idle);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "local synthesis failed, narration dropped");
                self.shared
                    .set_state_if_current(self.generation, NarratorState::Idle);
            }
        }
    }

    /// Start playback if this task is still the latest call.
    ///
    /// The staleness check and the `play` call happen under the same lock
    /// `speak()` holds while superseding, so a stale task can never start
    /// audio after a newer call's teardown.
    fn start_playback(
        &self,
        clip: AudioClip,
        state: NarratorState,
        channel: SpeechChannel,
    ) -> PlayOutcome {
        let _guard = self.shared.lock_play();
        if !self.shared.is_current(self.generation) {
            tracing::debug!(generation = self.generation, "narration superseded");
            return PlayOutcome::Superseded;
        }

        let shared = Arc::clone(&self.shared);
        let generation = self.generation;
        let on_done = Box::new(move || shared.finish_if_current(generation));

        if let Err(e) = self.output.play(clip, on_done) {
            return PlayOutcome::Failed(e);
        }

        self.shared.set_state(state);
        self.shared.emit(NarratorEvent::NarrationStarted { channel });
        PlayOutcome::Started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PlaybackDoneCallback;
    use crate::synth::{NullSynthesizer, RemoteClip};

    struct PendingRemote;

    #[async_trait::async_trait]
    impl RemoteSynthesizer for PendingRemote {
        async fn synthesize(
            &self,
            _text: &str,
            _language: Language,
        ) -> Result<RemoteClip, NarrateError> {
            std::future::pending().await
        }
    }

    struct SilentOutput;

    impl AudioOutput for SilentOutput {
        fn play(&self, _clip: AudioClip, _on_done: PlaybackDoneCallback) -> Result<(), NarrateError> {
            Ok(())
        }

        fn stop(&self) {}

        fn is_playing(&self) -> bool {
            false
        }
    }

    fn test_narrator() -> (Narrator, mpsc::UnboundedReceiver<NarratorEvent>) {
        Narrator::new(
            &NarratorConfig::default(),
            Arc::new(PendingRemote),
            Arc::new(NullSynthesizer),
            Arc::new(SilentOutput),
            SessionHealth::new(),
        )
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn narrator_creates_in_idle_state() {
        runtime().block_on(async {
            let (narrator, _rx) = test_narrator();
            assert_eq!(narrator.state(), NarratorState::Idle);
            assert!(!narrator.is_playing());
            assert!(!narrator.health().is_unavailable());
        });
    }

    #[test]
    fn empty_text_changes_nothing() {
        runtime().block_on(async {
            let (narrator, mut rx) = test_narrator();
            narrator.speak("   ", Language::English);

            assert_eq!(narrator.state(), NarratorState::Idle);
            assert!(rx.try_recv().is_err());
        });
    }

    #[test]
    fn stop_is_idempotent() {
        runtime().block_on(async {
            let (narrator, mut rx) = test_narrator();
            narrator.stop();
            narrator.stop();

            assert_eq!(narrator.state(), NarratorState::Idle);
            // Already idle: no transitions were emitted.
            assert!(rx.try_recv().is_err());
        });
    }

    #[test]
    fn degraded_session_starts_on_the_local_path() {
        runtime().block_on(async {
            let (narrator, _rx) = test_narrator();
            narrator.health().mark_unavailable();

            narrator.speak("Weather", Language::English);
            assert_eq!(narrator.state(), NarratorState::AttemptingLocal);
        });
    }
}
