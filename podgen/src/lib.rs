//! # podgen - Pipeline de génération de PodCraft
//!
//! À partir de documents PDF, d'un texte ou d'un simple sujet, produit un
//! podcast en trois étapes :
//!
//! 1. **script** : le service de texte écrit un dialogue selon le style
//!    choisi (`podcast`, `debate`, `duck`) ;
//! 2. **audio** : chaque réplique est lue par une voix du service de
//!    synthèse, puis les segments WAV sont assemblés ;
//! 3. **couverture** : le service d'image dessine la pochette.
//!
//! La progression de chaque exécution est consultable pendant la
//! génération (voir [`ProgressStore`]).
//!
//! ## Routes (feature `podserver`)
//!
//! - `POST /generate` - lance une génération, répond après le script
//! - `POST /api/generate-audio` - (re)génère l'audio d'un podcast
//! - `POST /api/generate-cover` - (re)génère la couverture d'un podcast
//! - `GET /api/audio-progress/{podcast_id}` - progression
//! - `GET /swagger-ui/generation` - documentation

pub mod error;
mod pipeline;
pub mod progress;
pub mod prompts;
mod run;
pub mod script;
pub mod validate;
pub mod voices;
pub mod wav;

#[cfg(feature = "podconfig")]
mod config_ext;

#[cfg(feature = "podserver")]
pub mod api;
#[cfg(feature = "podserver")]
mod server_ext;

pub use error::{GenerationError, Result};
pub use pipeline::{DEFAULT_SPEAKERS, Pipeline};
pub use progress::{MemoryProgressStore, ProgressStore};
pub use script::{DialogueLine, extract_title, parse_script};
pub use validate::{ValidatedRequest, validate_request};

#[cfg(feature = "podconfig")]
pub use config_ext::GenerationConfigExt;

#[cfg(feature = "podserver")]
use std::sync::Arc;

/// Trait d'extension pour ajouter la génération à podserver
#[cfg(feature = "podserver")]
#[async_trait::async_trait]
pub trait GenerationExt {
    /// Enregistre les routes de génération pour `pipeline`
    async fn init_generation(&mut self, pipeline: Arc<Pipeline>) -> anyhow::Result<Arc<Pipeline>>;

    /// Construit les clients des services depuis la configuration
    /// (`vendors.*`, `generation.*`) et enregistre les routes
    async fn init_generation_configured(
        &mut self,
        library: Arc<podlibrary::Library>,
    ) -> anyhow::Result<Arc<Pipeline>>;
}
