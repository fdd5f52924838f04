//! Integration tests for the `Narrator` resolution flow.
//!
//! These tests drive full narrations through mock synthesizers and a fake
//! audio output. No real audio hardware, model files, or network access is
//! required, and Tokio's paused clock makes the latency-budget tests
//! instant in wall time.
//!
//! # What is tested
//!
//! - Fresh narrators start idle, silent, and healthy
//! - Empty text is a no-op that leaves current playback untouched
//! - Remote success plays the remote clip and leaves the session healthy
//! - Natural completion emits `NarrationFinished` and returns to idle
//! - Rapid successive calls play only the newest request
//! - A server error falls back to on-device synthesis exactly once and
//!   degrades the session permanently
//! - A degraded session never contacts the remote service again
//! - A hung remote service is abandoned at the latency budget
//! - `stop()` supersedes in-flight work before it can start audio
//! - A failed fallback ends in silent idle, with no started event

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use vaani::{
    AudioClip, AudioOutput, DEFAULT_LATENCY_BUDGET, Language, LocalSynthesizer, NarrateError,
    Narrator, NarratorConfig, NarratorEvent, NarratorState, PcmClip, PlaybackDoneCallback,
    RemoteClip, RemoteSynthesizer, SessionHealth, SpeechChannel,
};

// ── Mock synthesizers ──────────────────────────────────────────────

enum RemoteBehavior {
    /// Answer with the request text as clip bytes after a delay.
    Respond(Duration),
    /// Fail immediately with an HTTP 500.
    Fail,
    /// Never answer.
    Hang,
}

/// A remote synthesizer with scripted behavior that records every call.
struct MockRemote {
    behavior: RemoteBehavior,
    calls: Mutex<Vec<(String, Language)>>,
}

impl MockRemote {
    fn respond_after(delay: Duration) -> Self {
        Self { behavior: RemoteBehavior::Respond(delay), calls: Mutex::new(Vec::new()) }
    }

    fn failing() -> Self {
        Self { behavior: RemoteBehavior::Fail, calls: Mutex::new(Vec::new()) }
    }

    fn hanging() -> Self {
        Self { behavior: RemoteBehavior::Hang, calls: Mutex::new(Vec::new()) }
    }

    fn calls(&self) -> Vec<(String, Language)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteSynthesizer for MockRemote {
    async fn synthesize(&self, text: &str, language: Language) -> Result<RemoteClip, NarrateError> {
        self.calls.lock().unwrap().push((text.to_string(), language));
        match self.behavior {
            RemoteBehavior::Respond(delay) => {
                tokio::time::sleep(delay).await;
                Ok(RemoteClip { bytes: text.as_bytes().to_vec(), cached: false })
            }
            RemoteBehavior::Fail => Err(NarrateError::ServerStatus(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            )),
            RemoteBehavior::Hang => std::future::pending().await,
        }
    }
}

/// An on-device synthesizer that returns a short burst of silence (or a
/// scripted failure) and records every call.
struct MockLocal {
    calls: Mutex<Vec<(String, Language)>>,
    fail: bool,
}

impl MockLocal {
    fn new() -> Self {
        Self { calls: Mutex::new(Vec::new()), fail: false }
    }

    fn failing() -> Self {
        Self { calls: Mutex::new(Vec::new()), fail: true }
    }

    fn calls(&self) -> Vec<(String, Language)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalSynthesizer for MockLocal {
    async fn synthesize(&self, text: &str, language: Language) -> Result<PcmClip, NarrateError> {
        self.calls.lock().unwrap().push((text.to_string(), language));
        if self.fail {
            return Err(NarrateError::LocalUnavailable("no voice models installed".to_string()));
        }
        Ok(PcmClip {
            samples: vec![0.0f32; 320], // 20 ms of silence at 16 kHz
            sample_rate: 16_000,
            duration: Duration::from_millis(20),
        })
    }

    fn voices(&self) -> Vec<vaani::VoiceInfo> {
        vec![]
    }
}

// ── Fake audio output ──────────────────────────────────────────────

#[derive(Default)]
struct FakeOutputState {
    played: Vec<AudioClip>,
    stops: usize,
    on_done: Option<PlaybackDoneCallback>,
    playing: bool,
}

/// An audio output that records plays and stops instead of making sound.
/// Natural completion is driven manually via [`FakeOutput::finish_current`].
#[derive(Default)]
struct FakeOutput {
    inner: Mutex<FakeOutputState>,
}

impl FakeOutput {
    fn played(&self) -> Vec<AudioClip> {
        self.inner.lock().unwrap().played.clone()
    }

    fn stops(&self) -> usize {
        self.inner.lock().unwrap().stops
    }

    /// Fire the pending completion callback, as the audio thread would
    /// when a clip drains.
    fn finish_current(&self) {
        let on_done = {
            let mut inner = self.inner.lock().unwrap();
            inner.playing = false;
            inner.on_done.take()
        };
        if let Some(on_done) = on_done {
            on_done();
        }
    }
}

impl AudioOutput for FakeOutput {
    fn play(&self, clip: AudioClip, on_done: PlaybackDoneCallback) -> Result<(), NarrateError> {
        let mut inner = self.inner.lock().unwrap();
        inner.played.push(clip);
        inner.on_done = Some(on_done);
        inner.playing = true;
        Ok(())
    }

    fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.stops += 1;
        inner.playing = false;
        // A stopped clip never completes naturally.
        inner.on_done = None;
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().unwrap().playing
    }
}

// ── Harness ────────────────────────────────────────────────────────

struct Harness {
    narrator: Narrator,
    rx: UnboundedReceiver<NarratorEvent>,
    remote: Arc<MockRemote>,
    local: Arc<MockLocal>,
    output: Arc<FakeOutput>,
}

/// Wire a narrator from the given mocks. Must run inside a runtime.
fn harness_with(remote: MockRemote, local: MockLocal) -> Harness {
    let remote = Arc::new(remote);
    let local = Arc::new(local);
    let output = Arc::new(FakeOutput::default());
    let (narrator, rx) = Narrator::new(
        &NarratorConfig::default(),
        remote.clone(),
        local.clone(),
        output.clone(),
        SessionHealth::new(),
    );
    Harness { narrator, rx, remote, local, output }
}

fn harness(remote: MockRemote) -> Harness {
    harness_with(remote, MockLocal::new())
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Await the next event, panicking if the narrator goes quiet. The bound
/// is virtual time: with the clock paused it costs no wall time.
async fn next_event(rx: &mut UnboundedReceiver<NarratorEvent>) -> NarratorEvent {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("no narrator event within bound")
        .expect("event channel closed")
}

/// Collect events until narration starts; returns the channel it started
/// on plus everything seen along the way.
async fn wait_for_started(
    rx: &mut UnboundedReceiver<NarratorEvent>,
) -> (SpeechChannel, Vec<NarratorEvent>) {
    let mut seen = Vec::new();
    loop {
        let event = next_event(rx).await;
        if let NarratorEvent::NarrationStarted { channel } = event {
            seen.push(event);
            return (channel, seen);
        }
        seen.push(event);
    }
}

/// Collect events until the given state is reached.
async fn wait_for_state(
    rx: &mut UnboundedReceiver<NarratorEvent>,
    target: NarratorState,
) -> Vec<NarratorEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = matches!(event, NarratorEvent::StateChanged(s) if s == target);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

/// Pull every event currently queued on the receiver.
fn drain_events(rx: &mut UnboundedReceiver<NarratorEvent>) -> Vec<NarratorEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

/// Collect only the state values from `StateChanged` events.
fn states_from(events: &[NarratorEvent]) -> Vec<NarratorState> {
    events
        .iter()
        .filter_map(|e| {
            if let NarratorEvent::StateChanged(s) = e {
                Some(*s)
            } else {
                None
            }
        })
        .collect()
}

// ── Scenarios ──────────────────────────────────────────────────────

#[test]
fn narrator_starts_idle_and_silent() {
    block_on(async {
        let h = harness(MockRemote::respond_after(Duration::ZERO));
        assert_eq!(h.narrator.state(), NarratorState::Idle);
        assert!(!h.narrator.is_playing());
        assert!(!h.narrator.health().is_unavailable());
        assert!(h.output.played().is_empty());
    });
}

#[test]
fn empty_text_leaves_playback_untouched() {
    block_on(async {
        let mut h = harness(MockRemote::respond_after(Duration::ZERO));
        h.narrator.speak("   ", Language::English);

        assert_eq!(h.narrator.state(), NarratorState::Idle);
        assert_eq!(h.output.stops(), 0, "empty text must not tear down playback");
        assert!(h.remote.calls().is_empty());
        assert!(h.rx.try_recv().is_err(), "no events expected for empty text");
    });
}

#[test]
fn remote_success_plays_the_remote_clip() {
    block_on(async {
        tokio::time::pause();
        let mut h = harness(MockRemote::respond_after(Duration::from_millis(150)));

        h.narrator.speak("Sowing advice", Language::English);
        let (channel, events) = wait_for_started(&mut h.rx).await;

        assert_eq!(channel, SpeechChannel::Remote);
        assert_eq!(
            states_from(&events),
            vec![NarratorState::AttemptingRemote, NarratorState::PlayingRemote]
        );
        assert_eq!(h.remote.calls(), vec![("Sowing advice".to_string(), Language::English)]);
        assert!(h.local.calls().is_empty(), "local backend must stay untouched");
        assert!(!h.narrator.health().is_unavailable());

        let played = h.output.played();
        assert_eq!(played.len(), 1);
        match &played[0] {
            AudioClip::Encoded(bytes) => assert_eq!(bytes.as_slice(), b"Sowing advice"),
            other => panic!("expected an encoded clip, got {other:?}"),
        }
    });
}

#[test]
fn natural_completion_returns_to_idle() {
    block_on(async {
        tokio::time::pause();
        let mut h = harness(MockRemote::respond_after(Duration::ZERO));

        h.narrator.speak("Done", Language::English);
        wait_for_started(&mut h.rx).await;

        h.output.finish_current();

        let finished = next_event(&mut h.rx).await;
        assert!(matches!(finished, NarratorEvent::NarrationFinished), "got {finished:?}");
        let idle = next_event(&mut h.rx).await;
        assert!(
            matches!(idle, NarratorEvent::StateChanged(NarratorState::Idle)),
            "got {idle:?}"
        );
        assert_eq!(h.narrator.state(), NarratorState::Idle);
        assert!(!h.narrator.is_playing());
    });
}

#[test]
fn rapid_successive_calls_play_only_the_last() {
    block_on(async {
        tokio::time::pause();
        let mut h = harness(MockRemote::respond_after(Duration::from_millis(50)));

        h.narrator.speak("First", Language::English);
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.narrator.speak("Second", Language::English);

        let (channel, events) = wait_for_started(&mut h.rx).await;
        assert_eq!(channel, SpeechChannel::Remote);

        // Both requests reached the remote service, but only the newest
        // one may become audible.
        assert_eq!(h.remote.calls().len(), 2);
        let played = h.output.played();
        assert_eq!(played.len(), 1, "exactly one clip may play, got {played:?}");
        match &played[0] {
            AudioClip::Encoded(bytes) => assert_eq!(bytes.as_slice(), b"Second"),
            other => panic!("expected an encoded clip, got {other:?}"),
        }

        let starts = events
            .iter()
            .filter(|e| matches!(e, NarratorEvent::NarrationStarted { .. }))
            .count();
        assert_eq!(starts, 1);
    });
}

#[test]
fn server_error_falls_back_to_local_once() {
    block_on(async {
        tokio::time::pause();
        let mut h = harness(MockRemote::failing());

        h.narrator.speak("Email", Language::English);
        let (channel, events) = wait_for_started(&mut h.rx).await;

        assert_eq!(channel, SpeechChannel::Local);
        assert_eq!(
            states_from(&events),
            vec![
                NarratorState::AttemptingRemote,
                NarratorState::AttemptingLocal,
                NarratorState::PlayingLocal,
            ]
        );
        assert_eq!(h.local.calls(), vec![("Email".to_string(), Language::English)]);
        assert!(h.narrator.health().is_unavailable(), "session must degrade");

        let played = h.output.played();
        assert_eq!(played.len(), 1);
        assert!(
            matches!(played[0], AudioClip::Pcm { sample_rate: 16_000, .. }),
            "expected on-device samples, got {:?}",
            played[0]
        );
    });
}

#[test]
fn degraded_session_skips_remote() {
    block_on(async {
        tokio::time::pause();
        let mut h = harness(MockRemote::failing());

        h.narrator.speak("Email", Language::Tamil);
        wait_for_started(&mut h.rx).await;
        assert_eq!(h.remote.calls().len(), 1);

        h.narrator.speak("Weather", Language::Tamil);
        let (channel, events) = wait_for_started(&mut h.rx).await;

        assert_eq!(channel, SpeechChannel::Local);
        assert_eq!(h.remote.calls().len(), 1, "remote must not be retried this session");
        assert_eq!(h.local.calls().len(), 2);
        assert!(
            !states_from(&events).contains(&NarratorState::AttemptingRemote),
            "degraded session went remote: {events:?}"
        );
    });
}

#[test]
fn slow_remote_is_abandoned_at_the_latency_budget() {
    block_on(async {
        tokio::time::pause();
        let mut h = harness(MockRemote::hanging());
        let asked_at = tokio::time::Instant::now();

        h.narrator.speak("Market prices", Language::Tamil);
        let (channel, _) = wait_for_started(&mut h.rx).await;

        assert_eq!(channel, SpeechChannel::Local);
        let waited = asked_at.elapsed();
        assert!(waited >= DEFAULT_LATENCY_BUDGET, "fell back too early: {waited:?}");
        assert!(
            waited < DEFAULT_LATENCY_BUDGET + Duration::from_millis(500),
            "fell back too late: {waited:?}"
        );
        assert_eq!(h.local.calls(), vec![("Market prices".to_string(), Language::Tamil)]);
        assert!(h.narrator.health().is_unavailable());
    });
}

#[test]
fn stop_supersedes_in_flight_work() {
    block_on(async {
        tokio::time::pause();
        let mut h = harness(MockRemote::respond_after(Duration::from_millis(50)));

        h.narrator.speak("Too late", Language::English);
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.narrator.stop();

        // Give the superseded response time to arrive and be discarded.
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(h.output.played().is_empty(), "superseded narration must not play");
        assert_eq!(h.narrator.state(), NarratorState::Idle);
        assert!(!h.narrator.is_playing());
        // The response did arrive (successfully), so the session stays healthy.
        assert!(!h.narrator.health().is_unavailable());

        let states = states_from(&drain_events(&mut h.rx));
        assert_eq!(states, vec![NarratorState::AttemptingRemote, NarratorState::Idle]);
    });
}

#[test]
fn failed_fallback_ends_in_silent_idle() {
    block_on(async {
        tokio::time::pause();
        let mut h = harness_with(MockRemote::failing(), MockLocal::failing());

        h.narrator.speak("Storage tips", Language::English);
        let events = wait_for_state(&mut h.rx, NarratorState::Idle).await;

        assert_eq!(
            states_from(&events),
            vec![
                NarratorState::AttemptingRemote,
                NarratorState::AttemptingLocal,
                NarratorState::Idle,
            ]
        );
        assert!(
            !events.iter().any(|e| matches!(e, NarratorEvent::NarrationStarted { .. })),
            "nothing may start when both channels fail: {events:?}"
        );
        assert!(h.output.played().is_empty());
        assert!(h.narrator.health().is_unavailable());
    });
}
