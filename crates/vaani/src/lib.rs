#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod audio_thread;
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod language;
pub mod models;
pub mod narrator;
pub mod output;
pub mod playback;
pub mod synth;

// Re-export key types for convenience
pub use audio_thread::AudioThreadHandle;
pub use cache::{AudioCache, CacheStats};
pub use config::{
    DEFAULT_ENDPOINT, DEFAULT_LATENCY_BUDGET, LocalConfig, NarratorConfig, RemoteConfig,
    default_cache_dir, default_model_dir,
};
pub use error::NarrateError;
pub use health::SessionHealth;
pub use language::Language;
pub use models::{VoiceModelCatalog, VoiceModelId, VoiceModelInfo};
pub use narrator::{Narrator, NarratorEvent, NarratorState, SpeechChannel};
pub use output::{AudioClip, AudioOutput, PlaybackDoneCallback};
pub use synth::remote::HttpSynthesizer;
pub use synth::{
    LocalSynthesizer, NullSynthesizer, PcmClip, RemoteClip, RemoteSynthesizer, VoiceInfo,
    select_voice,
};

#[cfg(feature = "sherpa")]
pub use models::ensure_voice_model;
#[cfg(feature = "sherpa")]
pub use synth::sherpa::{MMS_SAMPLE_RATE, SherpaSynthesizer};
