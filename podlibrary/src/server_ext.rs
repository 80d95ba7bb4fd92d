//! Implémentation du trait LibraryExt pour le serveur podserver
//!
//! `podlibrary` étend `podserver::Server` sans que `podserver` connaisse
//! `podlibrary`.
//!
//! ```rust,no_run
//! use podlibrary::LibraryExt;
//! use podserver::ServerBuilder;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut server = ServerBuilder::new("PodCraft", "http://localhost", 6000).build();
//! let library = server.init_library_configured().await?;
//! server.start().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use podconfig::get_config;
use podserver::Server;
use tracing::info;
use utoipa::OpenApi;

use crate::{Library, LibraryConfigExt, LibraryExt, api, media::MediaDirs};

#[async_trait::async_trait]
impl LibraryExt for Server {
    async fn init_library(&mut self, library: Arc<Library>) -> anyhow::Result<Arc<Library>> {
        // Fichiers média : GET /static/audio/{file}, GET /static/covers/{file}
        let audio_router = Router::new()
            .route("/{file}", get(api::serve_audio))
            .with_state(library.clone());
        self.add_router("/static/audio", audio_router).await;

        let covers_router = Router::new()
            .route("/{file}", get(api::serve_cover))
            .with_state(library.clone());
        self.add_router("/static/covers", covers_router).await;

        // Router API nesté sous /api/podcasts par add_openapi
        let api_router = Router::new()
            .route("/", get(api::list_podcasts))
            .route(
                "/{id}",
                get(api::get_podcast).delete(api::delete_podcast),
            )
            .route("/{id}/title", put(api::rename_podcast))
            .route("/{id}/listened", post(api::toggle_listened))
            .with_state(library.clone());

        self.add_openapi(api_router, api::ApiDoc::openapi(), "podcasts")
            .await;

        Ok(library)
    }

    async fn init_library_configured(&mut self) -> anyhow::Result<Arc<Library>> {
        let config = get_config();

        let data_dir = config.get_library_data_dir()?;
        let media = MediaDirs::new(config.get_audio_dir()?, config.get_covers_dir()?);

        info!(
            "library data {}, audio {}, covers {}",
            data_dir,
            media.audio.display(),
            media.covers.display()
        );

        let library = Arc::new(Library::open(&data_dir, media).await?);
        self.init_library(library).await
    }
}
