//! Progress polling
//!
//! Interroge la progression d'une génération à intervalle fixe jusqu'à un
//! statut terminal (`complete` ou `error`) ou jusqu'au nombre maximal de
//! tentatives. Chaque enregistrement reçu remplace simplement l'état
//! affiché. Un identifiant encore inconnu du serveur signifie « pas encore
//! démarré » : le polling continue.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use podclient::{PodcraftClient, PollOutcome, PollerOptions, ProgressPoller};
//!
//! # async fn example(podcast_id: String) -> podclient::Result<()> {
//! let client = Arc::new(PodcraftClient::new("http://localhost:6000")?);
//! let poller = ProgressPoller::new(client, PollerOptions::default());
//!
//! let handle = poller.spawn(podcast_id, |p| println!("{} {}%", p.step, p.progress));
//! match handle.outcome().await {
//!     PollOutcome::Completed(_) => println!("ready"),
//!     PollOutcome::Failed { message, .. } => println!("failed: {}", message),
//!     other => println!("{:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use podmodel::{GenerationProgress, GenerationStatus};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{PodcraftClient, error::Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Anything that can report the progress of a generation
#[async_trait]
pub trait ProgressSource: Send + Sync {
    /// Current record, `None` if the generation is not known yet
    async fn fetch_progress(&self, podcast_id: &str) -> Result<Option<GenerationProgress>>;
}

#[async_trait]
impl ProgressSource for PodcraftClient {
    async fn fetch_progress(&self, podcast_id: &str) -> Result<Option<GenerationProgress>> {
        self.get_progress(podcast_id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// How a polling session ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(GenerationProgress),
    /// The run reported `error`; the caller decides what to do with the
    /// partial podcast
    Failed { step: String, message: String },
    Cancelled,
    /// No terminal status within the attempt budget
    Exhausted { last: Option<GenerationProgress> },
}

#[derive(Clone)]
pub struct ProgressPoller {
    source: Arc<dyn ProgressSource>,
    options: PollerOptions,
}

impl ProgressPoller {
    pub fn new(source: Arc<dyn ProgressSource>, options: PollerOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> PollerOptions {
        self.options
    }

    /// Polls until a terminal status, cancellation or exhaustion
    ///
    /// `on_update` receives every record fetched, in order.
    pub async fn poll<F>(
        &self,
        podcast_id: &str,
        token: &CancellationToken,
        mut on_update: F,
    ) -> PollOutcome
    where
        F: FnMut(&GenerationProgress),
    {
        let mut last = None;

        for attempt in 1..=self.options.max_attempts {
            let fetched = tokio::select! {
                _ = token.cancelled() => return PollOutcome::Cancelled,
                fetched = self.source.fetch_progress(podcast_id) => fetched,
            };

            match fetched {
                Ok(Some(progress)) => {
                    on_update(&progress);
                    match progress.status {
                        GenerationStatus::Complete => return PollOutcome::Completed(progress),
                        GenerationStatus::Error => {
                            return PollOutcome::Failed {
                                step: progress.step,
                                message: progress.message,
                            };
                        }
                        _ => last = Some(progress),
                    }
                }
                Ok(None) => debug!("{}: not started yet (attempt {})", podcast_id, attempt),
                Err(e) => warn!("{}: progress unavailable (attempt {}): {}", podcast_id, attempt, e),
            }

            if attempt == self.options.max_attempts {
                break;
            }
            tokio::select! {
                _ = token.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(self.options.interval) => {}
            }
        }

        warn!(
            "{}: no final status after {} attempts",
            podcast_id, self.options.max_attempts
        );
        PollOutcome::Exhausted { last }
    }

    /// Polls on a background task
    ///
    /// Dropping the returned handle stops the task.
    pub fn spawn<F>(&self, podcast_id: impl Into<String>, on_update: F) -> PollHandle
    where
        F: FnMut(&GenerationProgress) + Send + 'static,
    {
        let token = CancellationToken::new();
        let poller = self.clone();
        let podcast_id = podcast_id.into();
        let task_token = token.clone();

        let join = tokio::spawn(async move {
            poller.poll(&podcast_id, &task_token, on_update).await
        });

        PollHandle {
            token,
            join: Some(join),
        }
    }
}

/// A polling task; cancelled when dropped
pub struct PollHandle {
    token: CancellationToken,
    join: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(|j| j.is_finished())
    }

    /// Waits for the task to end
    pub async fn outcome(mut self) -> PollOutcome {
        match self.join.take() {
            Some(join) => join.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
