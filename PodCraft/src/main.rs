use podconfig::get_config;
use podgen::GenerationExt;
use podlibrary::LibraryExt;
use podserver::{ConfigExt, LoggingOptions, ServerBuilder};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = get_config();

    // ========== PHASE 1 : Infrastructure ==========

    let mut server = ServerBuilder::new_configured().build();
    server
        .init_logging(LoggingOptions::from_config(&config))
        .await;

    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": "PodCraft",
                "version": env!("CARGO_PKG_VERSION"),
            })
        })
        .await;

    info!("Initializing configuration API...");
    server.init_config_api().await?;

    // ========== PHASE 2 : Bibliothèque et génération ==========

    info!("Opening podcast library...");
    let library = server.init_library_configured().await?;
    info!("{} podcast(s) in library", library.list().await?.len());

    info!("Initializing generation pipeline...");
    server.init_generation_configured(library).await?;

    // ========== PHASE 3 : Démarrage du serveur ==========

    info!("Starting HTTP server...");
    server.start().await?;

    info!("PodCraft is ready at {}", server.info().base_url);
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
