//! # podlibrary - Bibliothèque de podcasts
//!
//! Stockage des podcasts générés dans un fichier JSON unique, fichiers
//! audio et couvertures sur disque, et API REST associée.
//!
//! ## Routes (feature `podserver`)
//!
//! - `GET /api/podcasts` - liste, après réconciliation avec le répertoire audio
//! - `GET /api/podcasts/{id}` / `DELETE /api/podcasts/{id}`
//! - `PUT /api/podcasts/{id}/title` - renommage
//! - `POST /api/podcasts/{id}/listened` - bascule du statut « écouté »
//! - `GET /static/audio/{file}`, `GET /static/covers/{file}` - fichiers média
//! - `GET /swagger-ui/podcasts` - documentation

pub mod error;
pub mod media;
mod store;

#[cfg(feature = "podconfig")]
mod config_ext;

#[cfg(feature = "podserver")]
pub mod api;
#[cfg(feature = "podserver")]
mod server_ext;

pub use error::{LibraryError, Result};
pub use media::{MediaDirs, MediaKind};
pub use store::{LIBRARY_FILE_NAME, Library};

#[cfg(feature = "podconfig")]
pub use config_ext::LibraryConfigExt;

#[cfg(feature = "podserver")]
use std::sync::Arc;

/// Trait d'extension pour ajouter la bibliothèque à podserver
#[cfg(feature = "podserver")]
#[async_trait::async_trait]
pub trait LibraryExt {
    /// Enregistre les routes de la bibliothèque et des fichiers média
    async fn init_library(&mut self, library: Arc<Library>) -> anyhow::Result<Arc<Library>>;

    /// Ouvre la bibliothèque depuis la configuration (`storage.*`) et
    /// enregistre ses routes
    async fn init_library_configured(&mut self) -> anyhow::Result<Arc<Library>>;
}
