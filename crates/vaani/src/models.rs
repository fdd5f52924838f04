//! Voice model catalog — curated list of on-device TTS models.
//!
//! Models are VITS MMS ONNX archives (`.tar.bz2`) from the
//! [`k2-fsa/sherpa-onnx`](https://github.com/k2-fsa/sherpa-onnx/releases)
//! releases, one per supported language. Each archive extracts to a
//! directory containing `model.onnx` and `tokens.txt`, which is what
//! [`SherpaSynthesizer`](crate::synth::sherpa::SherpaSynthesizer) loads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::language::Language;

// ── Identity ───────────────────────────────────────────────────────

/// Stable identifier of a catalog voice model.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceModelId(pub String);

impl std::fmt::Display for VoiceModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Model info ─────────────────────────────────────────────────────

/// Information about an on-device TTS voice model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceModelInfo {
    /// Model identifier (e.g. `vits-mms-tam`).
    pub id: VoiceModelId,

    /// Human-readable name.
    pub name: String,

    /// Language this voice speaks.
    pub language: Language,

    /// URL of the `.tar.bz2` archive containing the ONNX model files.
    pub archive_url: String,

    /// Directory name inside the archive (also the on-disk folder name).
    pub dir_name: String,

    /// Approximate download size in bytes.
    pub size_bytes: u64,

    /// Approximate size as a human-readable string.
    pub size_display: String,
}

const MMS_ARCHIVE_BASE: &str =
    "https://github.com/k2-fsa/sherpa-onnx/releases/download/tts-models";

// ── Built-in catalog ───────────────────────────────────────────────

/// Fixed inventory of known-good models with deterministic download
/// URLs; one voice per supported language.
pub struct VoiceModelCatalog;

impl VoiceModelCatalog {
    /// All available TTS models, in [`Language::ALL`] order.
    #[must_use]
    pub fn tts_models() -> Vec<VoiceModelInfo> {
        vec![
            mms_model(
                "vits-mms-eng",
                "English (MMS)",
                Language::English,
                36_700_160, // ~35 MB
                "35 MB",
            ),
            mms_model(
                "vits-mms-tam",
                "Tamil (MMS)",
                Language::Tamil,
                37_748_736, // ~36 MB
                "36 MB",
            ),
        ]
    }

    /// Find a model by ID.
    #[must_use]
    pub fn find(id: &str) -> Option<VoiceModelInfo> {
        Self::tts_models().into_iter().find(|m| m.id.0 == id)
    }

    /// The model that speaks a given language.
    #[must_use]
    pub fn for_language(language: Language) -> Option<VoiceModelInfo> {
        Self::tts_models()
            .into_iter()
            .find(|m| m.language == language)
    }

    /// On-disk directory of a model under the given model root.
    #[must_use]
    pub fn model_dir(model_root: &Path, model: &VoiceModelInfo) -> PathBuf {
        model_root.join(&model.dir_name)
    }

    /// Whether a model's files are present under the given model root.
    #[must_use]
    pub fn is_downloaded(model_root: &Path, model: &VoiceModelInfo) -> bool {
        let dir = Self::model_dir(model_root, model);
        dir.join("model.onnx").exists() && dir.join("tokens.txt").exists()
    }
}

fn mms_model(
    id: &str,
    name: &str,
    language: Language,
    size_bytes: u64,
    size_display: &str,
) -> VoiceModelInfo {
    VoiceModelInfo {
        id: VoiceModelId(id.to_string()),
        name: name.to_string(),
        language,
        archive_url: format!("{MMS_ARCHIVE_BASE}/{id}.tar.bz2"),
        dir_name: id.to_string(),
        size_bytes,
        size_display: size_display.to_string(),
    }
}

// ── Model acquisition ──────────────────────────────────────────────

/// Fetch a `.tar.bz2` archive and unpack it into `dest_dir`.
///
/// The whole archive is buffered in memory, then unpacked on a blocking
/// thread. Returns the path to the unpacked directory; if that directory
/// already exists the download is skipped entirely.
#[cfg(feature = "sherpa")]
pub async fn download_and_extract_archive(
    url: &str,
    dest_dir: &Path,
    dir_name: &str,
    on_progress: impl Fn(u64, u64), // (bytes_downloaded, total_bytes)
) -> Result<PathBuf, crate::error::NarrateError> {
    use crate::error::NarrateError;

    let extract_path = dest_dir.join(dir_name);

    if extract_path.exists() {
        tracing::debug!(path = %extract_path.display(), "archive already extracted");
        return Ok(extract_path);
    }

    tokio::fs::create_dir_all(dest_dir).await?;

    tracing::info!(url, dest = %extract_path.display(), "downloading voice model archive");

    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| NarrateError::ModelDownload {
            name: url.to_string(),
            source: e.into(),
        })?;

    if !response.status().is_success() {
        return Err(NarrateError::ModelDownload {
            name: url.to_string(),
            source: anyhow::anyhow!("HTTP {}", response.status()),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut archive_bytes = Vec::with_capacity(usize::try_from(total_size).unwrap_or(0));
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| NarrateError::ModelDownload {
            name: url.to_string(),
            source: e.into(),
        })?
    {
        archive_bytes.extend_from_slice(&chunk);
        on_progress(
            archive_bytes.len() as u64,
            total_size.max(archive_bytes.len() as u64),
        );
    }

    tracing::info!(
        size_mb = archive_bytes.len() / 1_048_576,
        "archive downloaded, extracting"
    );

    // Extract in a blocking thread to avoid stalling the async runtime.
    let dest_owned = dest_dir.to_path_buf();
    let bytes_vec = archive_bytes;
    tokio::task::spawn_blocking(move || {
        let cursor = std::io::Cursor::new(bytes_vec);
        let decompressor = bzip2::read::BzDecoder::new(cursor);
        let mut archive = tar::Archive::new(decompressor);
        archive
            .unpack(&dest_owned)
            .map_err(|e| NarrateError::ModelDownload {
                name: "archive".to_string(),
                source: anyhow::anyhow!("failed to extract archive: {e}"),
            })?;
        Ok::<(), NarrateError>(())
    })
    .await
    .map_err(|e| NarrateError::ModelDownload {
        name: url.to_string(),
        source: anyhow::anyhow!("join error: {e}"),
    })??;

    tracing::info!(path = %extract_path.display(), "voice model extracted");
    Ok(extract_path)
}

/// Download the voice model for a language if not already present.
///
/// Returns the directory holding the extracted model files.
#[cfg(feature = "sherpa")]
pub async fn ensure_voice_model(
    model_root: &Path,
    language: Language,
    on_progress: impl Fn(u64, u64),
) -> Result<PathBuf, crate::error::NarrateError> {
    let model = VoiceModelCatalog::for_language(language).ok_or_else(|| {
        crate::error::NarrateError::LocalUnavailable(format!("no catalog voice for {language}"))
    })?;

    if VoiceModelCatalog::is_downloaded(model_root, &model) {
        let dir = VoiceModelCatalog::model_dir(model_root, &model);
        tracing::debug!(path = %dir.display(), "voice model already downloaded");
        return Ok(dir);
    }

    download_and_extract_archive(&model.archive_url, model_root, &model.dir_name, on_progress)
        .await
}
