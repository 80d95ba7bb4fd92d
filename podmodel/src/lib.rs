//! # podmodel - Modèle de données partagé de PodCraft
//!
//! Types communs au serveur et au client :
//!
//! - [`Podcast`] et [`PodcastFormat`] : entrées de la bibliothèque
//! - [`GenerationProgress`] et [`GenerationStatus`] : état d'une génération
//! - [`api`] : corps des requêtes et réponses REST

pub mod api;
mod podcast;
mod progress;

pub use api::*;
pub use podcast::{
    ADOPTED_AUDIO_DURATION, GenerationStyle, Podcast, PodcastFormat, estimate_duration,
};
pub use progress::{GenerationProgress, GenerationStatus, steps};

use thiserror::Error;

/// Erreurs de conversion du modèle
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown podcast format: {0}")]
    UnknownFormat(String),

    #[error("Invalid style. Must be 'podcast', 'debate', or 'duck' (got '{0}')")]
    UnknownStyle(String),
}
