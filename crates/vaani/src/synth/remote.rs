//! HTTP client for the remote synthesis endpoint.
//!
//! Wire protocol of the app backend's TTS route:
//!
//! ```text
//! POST {endpoint}            body: {"text": "...", "lang": "en"|"ta"}
//!   2xx -> {"audio_url": "https://...", "cached": bool}
//!   else -> {"error": "..."} (message used for diagnostics only)
//! GET {audio_url}            -> mp3 bytes
//! ```
//!
//! Both round trips happen inside the narrator's latency budget; the
//! budget is also installed as the client's own request timeout so a hung
//! server is abandoned even without the outer deadline.

use crate::cache::AudioCache;
use crate::config::RemoteConfig;
use crate::error::NarrateError;
use crate::language::Language;
use crate::synth::{RemoteClip, RemoteSynthesizer};

// ── Wire DTOs ──────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
    lang: Language,
}

#[derive(Debug, serde::Deserialize)]
struct GenerateResponse {
    audio_url: Option<String>,
    #[serde(default)]
    cached: bool,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Client ─────────────────────────────────────────────────────────

/// Remote synthesis over HTTP, with an optional on-disk clip cache in
/// front of the network.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    cache: Option<AudioCache>,
}

impl HttpSynthesizer {
    /// Build a client for the configured endpoint.
    pub fn new(config: &RemoteConfig, cache: Option<AudioCache>) -> Result<Self, NarrateError> {
        let client = reqwest::Client::builder()
            .timeout(config.latency_budget)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            cache,
        })
    }

    /// Fetch the synthesized clip bytes from the URL the endpoint returned.
    async fn fetch_clip(&self, url: &str) -> Result<Vec<u8>, NarrateError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NarrateError::ServerStatus(status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl RemoteSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<RemoteClip, NarrateError> {
        if let Some(cache) = &self.cache {
            if let Some(bytes) = cache.load(text, language).await {
                return Ok(RemoteClip {
                    bytes,
                    cached: true,
                });
            }
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest {
                text,
                lang: language,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The endpoint reports failures as {"error": "..."}; keep the
            // message for the log but fail on the status alone.
            let detail = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_default();
            tracing::warn!(%status, detail, "remote synthesis endpoint rejected request");
            return Err(NarrateError::ServerStatus(status));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            NarrateError::MalformedResponse(format!("unparseable response body: {e}"))
        })?;

        let audio_url = body.audio_url.ok_or_else(|| {
            NarrateError::MalformedResponse("response missing audio_url".to_string())
        })?;

        let bytes = self.fetch_clip(&audio_url).await?;

        if let Some(cache) = &self.cache {
            cache.store(text, language, &bytes).await;
        }

        tracing::debug!(
            bytes = bytes.len(),
            server_cached = body.cached,
            "remote clip fetched"
        );
        Ok(RemoteClip {
            bytes,
            cached: body.cached,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_wire_tags() {
        let request = GenerateRequest {
            text: "Email",
            lang: Language::Tamil,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, serde_json::json!({"text": "Email", "lang": "ta"}));
    }

    #[test]
    fn response_parses_with_and_without_cached() {
        let full: GenerateResponse =
            serde_json::from_str(r#"{"audio_url": "http://x/clip.mp3", "cached": true}"#).unwrap();
        assert_eq!(full.audio_url.as_deref(), Some("http://x/clip.mp3"));
        assert!(full.cached);

        let bare: GenerateResponse =
            serde_json::from_str(r#"{"audio_url": "http://x/clip.mp3"}"#).unwrap();
        assert!(!bare.cached);
    }

    #[test]
    fn error_body_parses_to_missing_audio_url() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"error": "Text is required"}"#).unwrap();
        assert!(body.audio_url.is_none());
    }

    #[test]
    fn cache_hit_short_circuits_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AudioCache::new(dir.path().to_path_buf());

        // Port 1 is never serving; any network attempt would error out.
        let config = RemoteConfig {
            endpoint: "http://127.0.0.1:1/api/tts/generate/".to_string(),
            ..RemoteConfig::default()
        };
        let synth = HttpSynthesizer::new(&config, Some(cache.clone())).unwrap();

        tokio_test::block_on(async {
            cache.store("Weather", Language::English, b"mp3").await;

            let clip = synth.synthesize("Weather", Language::English).await.unwrap();
            assert!(clip.cached);
            assert_eq!(clip.bytes, b"mp3");
        });
    }
}
