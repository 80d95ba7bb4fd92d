//! # podserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit le serveur HTTP de PodCraft. Les autres crates y
//! ajoutent leurs routes au travers de traits d'extension implémentés sur
//! [`Server`] (bibliothèque de podcasts, génération, configuration).
//!
//! ## Fonctionnalités
//!
//! - **API de haut niveau** : routes JSON, sous-routers, APIs documentées
//! - **Logs** : buffer circulaire consultable via `/api/logs/dump`, niveau modifiable à chaud
//! - **Documentation OpenAPI** : Swagger UI par API
//! - **CORS et limite de taille** des requêtes depuis la configuration
//! - **Arrêt gracieux** sur Ctrl+C
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use podserver::{ConfigExt, LoggingOptions, ServerBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new_configured().build();
//!     server.init_logging(LoggingOptions::default()).await;
//!     server.init_config_api().await?;
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;
mod config_ext;

pub use config_ext::ConfigExt;
pub use logs::{LogEntry, LogState, LoggingOptions};
pub use server::{Server, ServerBuilder, ServerInfo};
