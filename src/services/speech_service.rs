use crate::config::get_config;
use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Text-to-speech collaborator. `None` is a valid outcome meaning "let
/// the telephony provider speak the text itself", never an error.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Option<String>;
}

/// ElevenLabs-backed synthesizer with a content-addressed mp3 cache
/// under the static audio directory.
pub struct ElevenLabsSpeech {
    client: Client,
    cache: Mutex<HashMap<String, String>>,
}

impl ElevenLabsSpeech {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn filename_for(text: &str) -> String {
        let digest = Sha256::digest(text.as_bytes());
        format!("voice_{}.mp3", hex::encode(digest))
    }

    async fn generate(&self, text: &str) -> anyhow::Result<String> {
        let config = get_config();
        let filename = Self::filename_for(text);
        let filepath = Path::new(&config.audio_dir).join(&filename);
        let audio_url = format!("{}/static/audio/{}", config.base_url, filename);

        if tokio::fs::try_exists(&filepath).await.unwrap_or(false) {
            return Ok(audio_url);
        }

        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}",
            config.eleven_labs_voice_id
        );
        let payload = serde_json::json!({
            "text": text,
            "model_id": "eleven_monolingual_v1",
            "voice_settings": {
                "stability": 0.3,
                "similarity_boost": 0.5,
                "style": 0.0,
                "use_speaker_boost": true
            },
            "optimize_streaming_latency": 4
        });

        let res = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &config.eleven_labs_api_key)
            .json(&payload)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        if !res.status().is_success() {
            anyhow::bail!("ElevenLabs API {}: {}", res.status(), res.text().await.unwrap_or_default());
        }

        let audio: bytes::Bytes = res.bytes().await?;
        tokio::fs::create_dir_all(&config.audio_dir).await?;
        tokio::fs::write(&filepath, &audio).await?;

        Ok(audio_url)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSpeech {
    async fn synthesize(&self, text: &str) -> Option<String> {
        if let Some(url) = self.cache.lock().unwrap().get(text) {
            return Some(url.clone());
        }

        match self.generate(text).await {
            Ok(url) => {
                self.cache
                    .lock()
                    .unwrap()
                    .insert(text.to_string(), url.clone());
                Some(url)
            }
            Err(e) => {
                tracing::warn!("speech synthesis failed, falling back to provider TTS: {}", e);
                None
            }
        }
    }
}

/// Synthesizer that always defers to provider TTS. Used in tests and
/// deployments without an ElevenLabs account.
pub struct NullSpeech;

#[async_trait]
impl SpeechSynthesizer for NullSpeech {
    async fn synthesize(&self, _text: &str) -> Option<String> {
        None
    }
}
