//! Speech synthesis through the Cartesia bytes API

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Result, VendorError};

const SERVICE: &str = "cartesia";

pub const DEFAULT_TTS_BASE_URL: &str = "https://api.cartesia.ai";
pub const DEFAULT_TTS_MODEL: &str = "sonic-2";
pub const DEFAULT_TTS_API_VERSION: &str = "2024-06-10";
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_TTS_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    Female,
}

/// A voice offered by the speech service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub gender: VoiceGender,
    #[serde(default)]
    pub name: String,
}

impl Voice {
    pub fn new(id: impl Into<String>, gender: VoiceGender, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            gender,
            name: name.into(),
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.gender)
    }
}

/// Settings of the speech service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub api_version: String,
    pub sample_rate: u32,
    pub timeout_secs: u64,
    pub voices: Vec<Voice>,
}

impl TtsSettings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_TTS_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_TTS_MODEL.to_string(),
            api_version: DEFAULT_TTS_API_VERSION.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            timeout_secs: DEFAULT_TTS_TIMEOUT_SECS,
            voices: Vec::new(),
        }
    }
}

/// A service that reads a transcript aloud with a given voice
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns a complete WAV file (RIFF header included)
    async fn synthesize(&self, transcript: &str, voice_id: &str) -> Result<Vec<u8>>;
}

/// Cartesia `/tts/bytes` client
#[derive(Debug, Clone)]
pub struct CartesiaClient {
    client: Client,
    settings: TtsSettings,
}

impl CartesiaClient {
    pub fn new(settings: TtsSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| VendorError::Configuration(e.to_string()))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &TtsSettings {
        &self.settings
    }

    pub fn voices(&self) -> &[Voice] {
        &self.settings.voices
    }
}

#[async_trait]
impl SpeechSynthesizer for CartesiaClient {
    async fn synthesize(&self, transcript: &str, voice_id: &str) -> Result<Vec<u8>> {
        if self.settings.api_key.trim().is_empty() {
            return Err(VendorError::Configuration(
                "speech service API key is not set (vendors.tts.api_key)".to_string(),
            ));
        }

        let url = format!("{}/tts/bytes", self.settings.base_url.trim_end_matches('/'));
        let body = json!({
            "model_id": self.settings.model,
            "transcript": transcript,
            "voice": {"mode": "id", "id": voice_id},
            "output_format": {
                "container": "wav",
                "sample_rate": self.settings.sample_rate,
                "encoding": "pcm_s16le",
            },
        });

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.settings.api_key)
            .header("Cartesia-Version", &self.settings.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| VendorError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VendorError::from_status(SERVICE, status, &text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VendorError::transport(SERVICE, e))?;

        if bytes.is_empty() {
            return Err(VendorError::EmptyResponse(SERVICE));
        }

        debug!(
            "Synthesized {} bytes for {} characters with voice {}",
            bytes.len(),
            transcript.len(),
            voice_id
        );
        Ok(bytes.to_vec())
    }
}
