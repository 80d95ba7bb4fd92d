//! Progress records of generation runs
//!
//! Le pipeline écrit, les clients lisent (`GET /api/audio-progress/{id}`).
//! Chaque écriture remplace l'enregistrement précédent : le dernier
//! écrivain gagne. Les enregistrements n'expirent pas.

use std::collections::HashMap;

use async_trait::async_trait;
use podmodel::{GenerationProgress, GenerationStatus};
use tokio::sync::RwLock;

/// Storage for the latest progress record of each podcast
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Replaces the record of `podcast_id`
    async fn put(&self, podcast_id: &str, progress: GenerationProgress);

    /// Current record, `None` if nothing was ever written
    async fn get_progress(&self, podcast_id: &str) -> Option<GenerationProgress>;

    async fn set_progress(
        &self,
        podcast_id: &str,
        status: GenerationStatus,
        step: &str,
        percent: u8,
        message: &str,
    ) {
        self.put(
            podcast_id,
            GenerationProgress::new(status, step, percent, message),
        )
        .await;
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: RwLock<HashMap<String, GenerationProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn put(&self, podcast_id: &str, progress: GenerationProgress) {
        self.records
            .write()
            .await
            .insert(podcast_id.to_string(), progress);
    }

    async fn get_progress(&self, podcast_id: &str) -> Option<GenerationProgress> {
        self.records.read().await.get(podcast_id).cloned()
    }
}
