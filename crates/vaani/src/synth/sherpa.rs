//! Sherpa-ONNX VITS backend — implements [`LocalSynthesizer`] via `sherpa-rs`.
//!
//! Loads one `sherpa_rs::tts::VitsTts` engine per downloaded language
//! model. sherpa-rs exposes synthesis as `create(&mut self, …)`, so each
//! engine lives in an `Arc<Mutex<…>>` behind the `&self` trait method,
//! and inference runs on `tokio::task::spawn_blocking` to keep Tokio
//! workers free.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sherpa_rs::tts::{VitsTts, VitsTtsConfig};

use crate::config::LocalConfig;
use crate::error::NarrateError;
use crate::language::Language;
use crate::models::VoiceModelCatalog;
use crate::synth::{LocalSynthesizer, PcmClip, VoiceInfo, select_voice, voice_info};

/// Sample rate of the VITS MMS voices (16 kHz).
pub const MMS_SAMPLE_RATE: u32 = 16_000;

/// On-device synthesis over sherpa-onnx VITS models.
///
/// Built from whatever catalog models are present under the model root;
/// a language without a downloaded model falls back to the first loaded
/// engine rather than going silent.
pub struct SherpaSynthesizer {
    /// One loaded engine per language.
    ///
    /// Each engine sits behind `Arc<Mutex<…>>` so it can move into
    /// `spawn_blocking` closures while the outer `&self` stays alive;
    /// sherpa-rs ships its own `unsafe impl Send + Sync` for `VitsTts`.
    engines: HashMap<Language, Arc<Mutex<VitsTts>>>,

    /// Voice inventory matching the loaded engines.
    voices: Vec<VoiceInfo>,

    /// Speech speed multiplier (1.0 = natural pace).
    speed: f32,
}

impl SherpaSynthesizer {
    /// Load every downloaded catalog model under `model_root`.
    ///
    /// Models that are not downloaded are skipped; at least one engine
    /// must load or the backend reports itself unavailable.
    pub fn load(model_root: &Path, config: &LocalConfig) -> Result<Self, NarrateError> {
        if !model_root.exists() {
            return Err(NarrateError::ModelNotFound(model_root.to_path_buf()));
        }

        let mut engines = HashMap::new();
        let mut voices = Vec::new();

        for model in VoiceModelCatalog::tts_models() {
            if !VoiceModelCatalog::is_downloaded(model_root, &model) {
                tracing::debug!(model = %model.id, "voice model not downloaded, skipping");
                continue;
            }

            let dir = VoiceModelCatalog::model_dir(model_root, &model);
            let model_path = path_to_string(&dir.join("model.onnx"))?;
            let tokens_path = path_to_string(&dir.join("tokens.txt"))?;

            tracing::info!(
                model = %model.id,
                language = %model.language,
                speed = config.speed,
                "loading VITS voice model"
            );

            let engine = VitsTts::new(VitsTtsConfig {
                model: model_path,
                tokens: tokens_path,
                ..VitsTtsConfig::default()
            });

            engines.insert(model.language, Arc::new(Mutex::new(engine)));
            voices.push(voice_info(&model.id.0, &model.name, model.language, "mms"));
        }

        if engines.is_empty() {
            return Err(NarrateError::LocalUnavailable(format!(
                "no voice models under {}",
                model_root.display()
            )));
        }

        Ok(Self {
            engines,
            voices,
            speed: config.speed,
        })
    }

    /// Engine for a language, or the first loaded engine when the
    /// inventory has no voice for it (the default-voice tier).
    fn engine_for(&self, language: Language) -> Result<Arc<Mutex<VitsTts>>, NarrateError> {
        if let Some(voice) = select_voice(&self.voices, language)
            && let Some(engine) = self.engines.get(&voice.language)
        {
            return Ok(Arc::clone(engine));
        }

        Language::ALL
            .iter()
            .find_map(|l| self.engines.get(l))
            .map(Arc::clone)
            .ok_or_else(|| NarrateError::LocalUnavailable("no voice engines loaded".to_string()))
    }
}

#[async_trait::async_trait]
impl LocalSynthesizer for SherpaSynthesizer {
    async fn synthesize(&self, text: &str, language: Language) -> Result<PcmClip, NarrateError> {
        if text.trim().is_empty() {
            return Ok(PcmClip {
                samples: Vec::new(),
                sample_rate: MMS_SAMPLE_RATE,
                duration: Duration::ZERO,
            });
        }

        let engine = self.engine_for(language)?;

        tracing::debug!(text_len = text.len(), %language, "synthesizing speech (VITS)");

        // VITS inference is CPU-bound and can take hundreds of
        // milliseconds. Offload to the blocking pool.
        let speed = self.speed;
        let text = text.to_string();

        let audio = tokio::task::spawn_blocking(move || {
            engine
                .lock()
                .map_err(|e| {
                    NarrateError::LocalUnavailable(format!("TTS engine lock poisoned: {e}"))
                })
                .and_then(|mut guard| {
                    // MMS voices are single-speaker: speaker id 0.
                    guard
                        .create(&text, 0, speed)
                        .map_err(|e| NarrateError::LocalUnavailable(format!("{e}")))
                })
        })
        .await
        .map_err(|e| NarrateError::LocalUnavailable(format!("spawn_blocking join error: {e}")))??;

        let sample_rate = audio.sample_rate;
        let samples = audio.samples;

        #[allow(clippy::cast_precision_loss)]
        let duration = if sample_rate > 0 {
            Duration::from_secs_f64(samples.len() as f64 / f64::from(sample_rate))
        } else {
            Duration::ZERO
        };

        tracing::debug!(
            samples = samples.len(),
            sample_rate,
            duration_ms = duration.as_millis(),
            "speech synthesized (VITS)"
        );

        Ok(PcmClip {
            samples,
            sample_rate,
            duration,
        })
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }
}

/// Convert a path to a string, failing on invalid UTF-8.
fn path_to_string(path: &Path) -> Result<String, NarrateError> {
    path.to_str()
        .map(ToString::to_string)
        .ok_or_else(|| NarrateError::LocalUnavailable(format!("invalid path: {}", path.display())))
}
