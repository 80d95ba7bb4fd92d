//! Cover image generation through the Hugging Face inference API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{Result, VendorError};

const SERVICE: &str = "huggingface";

pub const DEFAULT_IMAGE_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";
pub const DEFAULT_GUIDANCE_SCALE: f64 = 7.5;
pub const DEFAULT_INFERENCE_STEPS: u32 = 50;
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 60;

/// Settings of the image service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub url: String,
    pub api_key: String,
    pub guidance_scale: f64,
    pub inference_steps: u32,
    pub timeout_secs: u64,
}

impl ImageSettings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_IMAGE_URL.to_string(),
            api_key: api_key.into(),
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            inference_steps: DEFAULT_INFERENCE_STEPS,
            timeout_secs: DEFAULT_IMAGE_TIMEOUT_SECS,
        }
    }
}

/// Generated image bytes and the file extension matching their type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// A service that renders a prompt into an image
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;
}

/// Hugging Face inference client
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    client: Client,
    settings: ImageSettings,
}

impl HuggingFaceClient {
    pub fn new(settings: ImageSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| VendorError::Configuration(e.to_string()))?;

        Ok(Self { client, settings })
    }
}

/// Extension de fichier déduite du Content-Type (png par défaut)
pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let Some(content_type) = content_type else {
        return "png";
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "png",
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        if self.settings.api_key.trim().is_empty() {
            return Err(VendorError::Configuration(
                "image service API key is not set (vendors.image.api_key)".to_string(),
            ));
        }

        info!(
            "Requesting cover image: {}",
            prompt.chars().take(100).collect::<String>()
        );

        let body = json!({
            "inputs": prompt,
            "parameters": {
                "guidance_scale": self.settings.guidance_scale,
                "num_inference_steps": self.settings.inference_steps,
            },
        });

        let response = self
            .client
            .post(&self.settings.url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VendorError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VendorError::from_status(SERVICE, status, &text));
        }

        let extension = extension_for_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let bytes = response
            .bytes()
            .await
            .map_err(|e| VendorError::transport(SERVICE, e))?;

        if bytes.is_empty() {
            return Err(VendorError::EmptyResponse(SERVICE));
        }

        debug!("Image service returned {} bytes ({})", bytes.len(), extension);
        Ok(GeneratedImage {
            bytes: bytes.to_vec(),
            extension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_to_extension() {
        assert_eq!(extension_for_content_type(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for_content_type(Some("image/webp; charset=binary")), "webp");
        assert_eq!(extension_for_content_type(Some("IMAGE/PNG")), "png");
        assert_eq!(extension_for_content_type(None), "png");
    }
}
