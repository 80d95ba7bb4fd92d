//! Implémentation du trait GenerationExt pour le serveur podserver
//!
//! ```rust,no_run
//! use podgen::GenerationExt;
//! use podlibrary::LibraryExt;
//! use podserver::ServerBuilder;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut server = ServerBuilder::new_configured().build();
//! let library = server.init_library_configured().await?;
//! server.init_generation_configured(library).await?;
//! server.start().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use podconfig::get_config;
use podlibrary::Library;
use podserver::Server;
use podvendors::{AnthropicClient, CartesiaClient, HuggingFaceClient, VendorConfigExt};
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::{GenerationConfigExt, GenerationExt, Pipeline, api};

#[async_trait::async_trait]
impl GenerationExt for Server {
    async fn init_generation(&mut self, pipeline: Arc<Pipeline>) -> anyhow::Result<Arc<Pipeline>> {
        // Chemins absolus : le router est fusionné à la racine
        let router = Router::new()
            .route("/generate", post(api::generate))
            .route("/api/generate-audio", post(api::generate_audio))
            .route("/api/generate-cover", post(api::generate_cover))
            .route(
                "/api/audio-progress/{podcast_id}",
                get(api::audio_progress),
            )
            .with_state(pipeline.clone());

        self.add_documented_router(router, api::ApiDoc::openapi(), "generation")
            .await;

        Ok(pipeline)
    }

    async fn init_generation_configured(
        &mut self,
        library: Arc<Library>,
    ) -> anyhow::Result<Arc<Pipeline>> {
        let config = get_config();

        let llm = config.get_llm_settings()?;
        let tts = config.get_tts_settings()?;
        let image = config.get_image_settings()?;

        for (service, key) in [
            ("text", &llm.api_key),
            ("speech", &tts.api_key),
            ("image", &image.api_key),
        ] {
            if key.trim().is_empty() {
                warn!("No API key for the {} service: its step will fail", service);
            }
        }

        let speech = CartesiaClient::new(tts)?;
        let voices = speech.voices().to_vec();
        if voices.is_empty() {
            warn!("No voice configured (vendors.tts.voices): audio generation will fail");
        }

        let default_speakers = config.get_default_speakers()?;
        info!(
            "Generation pipeline: model {}, {} voice(s), {} speaker(s) by default",
            llm.model,
            voices.len(),
            default_speakers
        );

        let pipeline = Pipeline::new(
            Arc::new(AnthropicClient::new(llm)?),
            Arc::new(speech),
            Arc::new(HuggingFaceClient::new(image)?),
            library,
        )
        .with_voices(voices)
        .with_default_speakers(default_speakers);

        self.init_generation(Arc::new(pipeline)).await
    }
}
