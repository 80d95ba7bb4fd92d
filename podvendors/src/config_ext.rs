//! Extension pour lire les réglages des services externes dans podconfig
//!
//! Les clés API vides dans la configuration sont complétées par les
//! variables d'environnement `ANTHROPIC_API_KEY`, `CARTESIA_API_KEY` et
//! `HF_TOKEN`.
//!
//! ```no_run
//! use podconfig::get_config;
//! use podvendors::{AnthropicClient, VendorConfigExt};
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = get_config().get_llm_settings()?;
//! let client = AnthropicClient::new(settings)?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use podconfig::Config;
use serde_yaml::Value;
use tracing::warn;

use crate::{
    image::{
        DEFAULT_GUIDANCE_SCALE, DEFAULT_IMAGE_TIMEOUT_SECS, DEFAULT_IMAGE_URL,
        DEFAULT_INFERENCE_STEPS, ImageSettings,
    },
    speech::{
        DEFAULT_SAMPLE_RATE, DEFAULT_TTS_API_VERSION, DEFAULT_TTS_BASE_URL, DEFAULT_TTS_MODEL,
        DEFAULT_TTS_TIMEOUT_SECS, TtsSettings, Voice,
    },
    text::{
        DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MAX_TOKENS, DEFAULT_LLM_MODEL,
        DEFAULT_LLM_TIMEOUT_SECS, LlmSettings,
    },
};

const LLM: [&str; 2] = ["vendors", "llm"];
const TTS: [&str; 2] = ["vendors", "tts"];
const IMAGE: [&str; 2] = ["vendors", "image"];

/// Trait d'extension pour les réglages des services de texte, voix et image
pub trait VendorConfigExt {
    fn get_llm_settings(&self) -> Result<LlmSettings>;
    fn get_tts_settings(&self) -> Result<TtsSettings>;
    fn get_image_settings(&self) -> Result<ImageSettings>;

    /// Voix configurées, dans l'ordre de `vendors.tts.voices`
    fn get_tts_voices(&self) -> Result<Vec<Voice>>;

    fn set_llm_api_key(&self, key: String) -> Result<()>;
    fn set_tts_api_key(&self, key: String) -> Result<()>;
    fn set_image_api_key(&self, key: String) -> Result<()>;
}

fn key_path<'a>(section: &[&'a str; 2], key: &'a str) -> [&'a str; 3] {
    [section[0], section[1], key]
}

fn api_key(config: &Config, section: &[&str; 2], env_var: &str) -> String {
    let configured = config.get_string_or(&key_path(section, "api_key"), "");
    if !configured.trim().is_empty() {
        return configured;
    }
    std::env::var(env_var).unwrap_or_default()
}

impl VendorConfigExt for Config {
    fn get_llm_settings(&self) -> Result<LlmSettings> {
        Ok(LlmSettings {
            base_url: self.get_string_or(&key_path(&LLM, "base_url"), DEFAULT_LLM_BASE_URL),
            api_key: api_key(self, &LLM, "ANTHROPIC_API_KEY"),
            model: self.get_string_or(&key_path(&LLM, "model"), DEFAULT_LLM_MODEL),
            max_tokens: self
                .get_u64_or(&key_path(&LLM, "max_tokens"), DEFAULT_LLM_MAX_TOKENS as u64)
                as u32,
            timeout_secs: self
                .get_u64_or(&key_path(&LLM, "timeout_secs"), DEFAULT_LLM_TIMEOUT_SECS),
        })
    }

    fn get_tts_settings(&self) -> Result<TtsSettings> {
        Ok(TtsSettings {
            base_url: self.get_string_or(&key_path(&TTS, "base_url"), DEFAULT_TTS_BASE_URL),
            api_key: api_key(self, &TTS, "CARTESIA_API_KEY"),
            model: self.get_string_or(&key_path(&TTS, "model"), DEFAULT_TTS_MODEL),
            api_version: self
                .get_string_or(&key_path(&TTS, "api_version"), DEFAULT_TTS_API_VERSION),
            sample_rate: self
                .get_u64_or(&key_path(&TTS, "sample_rate"), DEFAULT_SAMPLE_RATE as u64)
                as u32,
            timeout_secs: self
                .get_u64_or(&key_path(&TTS, "timeout_secs"), DEFAULT_TTS_TIMEOUT_SECS),
            voices: self.get_tts_voices()?,
        })
    }

    fn get_image_settings(&self) -> Result<ImageSettings> {
        Ok(ImageSettings {
            url: self.get_string_or(&key_path(&IMAGE, "url"), DEFAULT_IMAGE_URL),
            api_key: api_key(self, &IMAGE, "HF_TOKEN"),
            guidance_scale: self
                .get_f64_or(&key_path(&IMAGE, "guidance_scale"), DEFAULT_GUIDANCE_SCALE),
            inference_steps: self.get_u64_or(
                &key_path(&IMAGE, "inference_steps"),
                DEFAULT_INFERENCE_STEPS as u64,
            ) as u32,
            timeout_secs: self
                .get_u64_or(&key_path(&IMAGE, "timeout_secs"), DEFAULT_IMAGE_TIMEOUT_SECS),
        })
    }

    fn get_tts_voices(&self) -> Result<Vec<Voice>> {
        match self.get_value(&key_path(&TTS, "voices")) {
            Ok(value @ Value::Sequence(_)) => Ok(serde_yaml::from_value(value)?),
            Ok(_) | Err(_) => {
                warn!("No voices configured under vendors.tts.voices");
                Ok(Vec::new())
            }
        }
    }

    fn set_llm_api_key(&self, key: String) -> Result<()> {
        self.set_value(&key_path(&LLM, "api_key"), Value::String(key))
    }

    fn set_tts_api_key(&self, key: String) -> Result<()> {
        self.set_value(&key_path(&TTS, "api_key"), Value::String(key))
    }

    fn set_image_api_key(&self, key: String) -> Result<()> {
        self.set_value(&key_path(&IMAGE, "api_key"), Value::String(key))
    }
}
