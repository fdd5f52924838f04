//! Synthesis capability traits — engine-agnostic seams for the two
//! speech channels.
//!
//! [`RemoteSynthesizer`] and [`LocalSynthesizer`] abstract over where a
//! clip comes from. The [`Narrator`](crate::narrator::Narrator) operates
//! on trait objects (`Arc<dyn RemoteSynthesizer>`,
//! `Arc<dyn LocalSynthesizer>`) so channels can be swapped, and tests can
//! substitute doubles, without touching the orchestration logic.
//!
//! ## Implementations
//!
//! | Feature  | Module     | Channel          |
//! |----------|------------|------------------|
//! | (always) | [`remote`] | HTTP endpoint    |
//! | `sherpa` | [`sherpa`] | on-device ONNX   |

pub mod remote;
#[cfg(feature = "sherpa")]
pub mod sherpa;

use std::time::Duration;

use crate::error::NarrateError;
use crate::language::Language;

// ── Shared types ───────────────────────────────────────────────────

/// Encoded clip fetched from the remote channel.
#[derive(Debug, Clone)]
pub struct RemoteClip {
    /// Container-encoded audio (mp3) ready for decoding.
    pub bytes: Vec<u8>,

    /// Whether the clip came from a cache rather than fresh synthesis.
    pub cached: bool,
}

/// PCM clip produced by on-device synthesis.
#[derive(Debug, Clone)]
pub struct PcmClip {
    /// Mono f32 samples.
    pub samples: Vec<f32>,

    /// Sample rate of the audio (e.g. 16 000 Hz for the MMS voices).
    pub sample_rate: u32,

    /// Length of the synthesized speech.
    pub duration: Duration,
}

/// Information about an available on-device voice.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    /// Voice identifier (model id).
    pub id: String,

    /// Display name for listings.
    pub name: String,

    /// Language the voice speaks.
    pub language: Language,

    /// Engine or model family that provides the voice.
    pub provider: String,
}

// ── Capability traits ──────────────────────────────────────────────

/// Remote synthesis capability.
///
/// One bounded attempt per call. The narrator owns the timeout and the
/// give-up-for-the-session policy, so implementations never retry
/// internally.
#[async_trait::async_trait]
pub trait RemoteSynthesizer: Send + Sync {
    /// Synthesize `text` in `language`, returning the encoded clip.
    async fn synthesize(&self, text: &str, language: Language)
    -> Result<RemoteClip, NarrateError>;
}

/// On-device synthesis capability.
///
/// Implementations must be `Send + Sync`; inference that blocks must be
/// dispatched to a blocking thread rather than stalling the runtime.
#[async_trait::async_trait]
pub trait LocalSynthesizer: Send + Sync {
    /// Synthesize `text` in `language` to PCM.
    async fn synthesize(&self, text: &str, language: Language) -> Result<PcmClip, NarrateError>;

    /// Voice inventory, used for selection and CLI listings.
    fn voices(&self) -> Vec<VoiceInfo>;
}

// ── Voice selection ────────────────────────────────────────────────

/// Providers whose voices win when several match the requested language.
const PREFERRED_PROVIDERS: [&str; 2] = ["google", "mms"];

/// Pick the best voice for a language from an inventory.
///
/// Preference order: a language match from a preferred provider, then any
/// language match, then `None` (caller falls back to the engine default).
#[must_use]
pub fn select_voice(voices: &[VoiceInfo], language: Language) -> Option<&VoiceInfo> {
    let mut fallback = None;
    for voice in voices.iter().filter(|v| v.language == language) {
        let provider = voice.provider.to_ascii_lowercase();
        if PREFERRED_PROVIDERS.iter().any(|p| provider.contains(p)) {
            return Some(voice);
        }
        fallback.get_or_insert(voice);
    }
    fallback
}

// ── Null backend ───────────────────────────────────────────────────

/// Stand-in local backend for builds without an on-device engine.
///
/// Always reports the capability as unavailable, so the narrator's
/// collaborator set stays total and the fallback path degrades to
/// silence instead of failing to construct.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSynthesizer;

#[async_trait::async_trait]
impl LocalSynthesizer for NullSynthesizer {
    async fn synthesize(&self, _text: &str, _language: Language) -> Result<PcmClip, NarrateError> {
        Err(NarrateError::LocalUnavailable(
            "no on-device synthesis backend available".to_string(),
        ))
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Shorthand constructor for [`VoiceInfo`].
pub(crate) fn voice_info(id: &str, name: &str, language: Language, provider: &str) -> VoiceInfo {
    VoiceInfo {
        id: id.to_string(),
        name: name.to_string(),
        language,
        provider: provider.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Vec<VoiceInfo> {
        vec![
            voice_info("eng-generic", "English (generic)", Language::English, "espeak"),
            voice_info("vits-mms-eng", "English (MMS)", Language::English, "mms"),
            voice_info("vits-mms-tam", "Tamil (MMS)", Language::Tamil, "mms"),
        ]
    }

    #[test]
    fn preferred_provider_wins_within_language() {
        let voices = inventory();
        let chosen = select_voice(&voices, Language::English).unwrap();
        assert_eq!(chosen.id, "vits-mms-eng");
    }

    #[test]
    fn any_language_match_beats_nothing() {
        let voices = vec![voice_info(
            "eng-generic",
            "English (generic)",
            Language::English,
            "espeak",
        )];
        let chosen = select_voice(&voices, Language::English).unwrap();
        assert_eq!(chosen.id, "eng-generic");
    }

    #[test]
    fn no_language_match_yields_none() {
        let voices = vec![voice_info(
            "vits-mms-eng",
            "English (MMS)",
            Language::English,
            "mms",
        )];
        assert!(select_voice(&voices, Language::Tamil).is_none());
    }

    #[test]
    fn null_synthesizer_is_unavailable() {
        let null = NullSynthesizer;
        assert!(null.voices().is_empty());

        let result = tokio_test::block_on(null.synthesize("hello", Language::English));
        assert!(matches!(result, Err(NarrateError::LocalUnavailable(_))));
    }
}
