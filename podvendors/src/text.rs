//! Text generation through the Anthropic Messages API
//!
//! ```no_run
//! use podvendors::{AnthropicClient, LlmSettings, TextGenerator, TextRequest};
//!
//! # async fn example() -> podvendors::Result<()> {
//! let client = AnthropicClient::new(LlmSettings::with_api_key("sk-ant-..."))?;
//! let reply = client
//!     .generate(TextRequest::new("You write podcast scripts.", "Explain tides."))
//!     .await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{Result, VendorError};

const SERVICE: &str = "anthropic";

/// Version de l'API Messages envoyée dans `anthropic-version`
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_LLM_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 180;

/// Settings of the text service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_LLM_MODEL.to_string(),
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

/// One completion request
#[derive(Debug, Clone, Default)]
pub struct TextRequest {
    pub system: String,
    pub prompt: String,
    /// PDF documents, base64-encoded, attached before the prompt
    pub documents: Vec<String>,
    /// Remplace `max_tokens` des réglages quand présent
    pub max_tokens: Option<u32>,
}

impl TextRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_documents(mut self, documents: Vec<String>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A service that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: TextRequest) -> Result<String>;
}

/// Anthropic Messages API client
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    settings: LlmSettings,
}

impl AnthropicClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| VendorError::Configuration(e.to_string()))?;

        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    fn body(&self, request: &TextRequest) -> Value {
        let mut content: Vec<Value> = request
            .documents
            .iter()
            .map(|data| {
                json!({
                    "type": "document",
                    "source": {
                        "type": "base64",
                        "media_type": "application/pdf",
                        "data": data,
                    }
                })
            })
            .collect();
        content.push(json!({"type": "text", "text": request.prompt}));

        json!({
            "model": self.settings.model,
            "max_tokens": request.max_tokens.unwrap_or(self.settings.max_tokens),
            "system": request.system,
            "messages": [
                {"role": "user", "content": content}
            ],
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, request: TextRequest) -> Result<String> {
        if self.settings.api_key.trim().is_empty() {
            return Err(VendorError::Configuration(
                "text service API key is not set (vendors.llm.api_key)".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/messages",
            self.settings.base_url.trim_end_matches('/')
        );
        info!(
            "Calling text service (model {}, {} document(s))",
            self.settings.model,
            request.documents.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|e| VendorError::transport(SERVICE, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| VendorError::transport(SERVICE, e))?;

        if !status.is_success() {
            return Err(VendorError::from_status(SERVICE, status, &text));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)?;
        let reply: String = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();

        if reply.trim().is_empty() {
            return Err(VendorError::EmptyResponse(SERVICE));
        }

        debug!("Text service returned {} characters", reply.len());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_precede_the_prompt() {
        let client = AnthropicClient::new(LlmSettings::with_api_key("key")).unwrap();
        let body = client.body(
            &TextRequest::new("system", "Write it")
                .with_documents(vec!["JVBERi0=".to_string()])
                .with_max_tokens(300),
        );

        let content = body["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["type"], "document");
        assert_eq!(content[0]["source"]["media_type"], "application/pdf");
        assert_eq!(content[1]["text"], "Write it");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["system"], "system");
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let client = AnthropicClient::new(LlmSettings::with_api_key("  ")).unwrap();
        let err = client.generate(TextRequest::new("s", "p")).await.unwrap_err();
        assert!(matches!(err, VendorError::Configuration(_)));
    }
}
