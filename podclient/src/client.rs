//! Typed client for the PodCraft REST API

use std::time::Duration;

use podmodel::{
    AudioRequest, AudioResponse, CoverRequest, CoverResponse, DeleteResponse, ErrorResponse,
    GenerateRequest, GenerateResponse, GenerationProgress, Podcast, PodcastEnvelope, PodcastList,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Délai par défaut d'une requête ; `/generate` attend la fin du script
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct PodcraftClient {
    base_url: String,
    http: Client,
}

impl PodcraftClient {
    /// Client for the server at `base_url` (e.g. `http://localhost:6000`)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (error, message) = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(e) => (e.error, e.message),
            Err(_) if !body.trim().is_empty() => (body.trim().to_string(), None),
            Err(_) => (
                status.canonical_reason().unwrap_or("error").to_string(),
                None,
            ),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            error,
            message,
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json().await?)
    }

    /// Starts a generation; returns once the script is written
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        debug!("POST /generate");
        self.json(self.http.post(self.url("/generate")).json(request))
            .await
    }

    /// Progress of a generation, `None` while the server has no record yet
    pub async fn get_progress(&self, podcast_id: &str) -> Result<Option<GenerationProgress>> {
        let request = self
            .http
            .get(self.url(&format!("/api/audio-progress/{}", podcast_id)));
        match self.json(request).await {
            Ok(progress) => Ok(Some(progress)),
            Err(ClientError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn generate_audio(&self, request: &AudioRequest) -> Result<AudioResponse> {
        self.json(self.http.post(self.url("/api/generate-audio")).json(request))
            .await
    }

    pub async fn generate_cover(&self, request: &CoverRequest) -> Result<CoverResponse> {
        self.json(self.http.post(self.url("/api/generate-cover")).json(request))
            .await
    }

    pub async fn list_podcasts(&self) -> Result<Vec<Podcast>> {
        let list: PodcastList = self.json(self.http.get(self.url("/api/podcasts"))).await?;
        Ok(list.podcasts)
    }

    pub async fn get_podcast(&self, podcast_id: &str) -> Result<Podcast> {
        let envelope: PodcastEnvelope = self
            .json(self.http.get(self.url(&format!("/api/podcasts/{}", podcast_id))))
            .await?;
        Ok(envelope.podcast)
    }

    pub async fn delete_podcast(&self, podcast_id: &str) -> Result<DeleteResponse> {
        self.json(
            self.http
                .delete(self.url(&format!("/api/podcasts/{}", podcast_id))),
        )
        .await
    }
}
