//! # podclient - Client de l'API PodCraft
//!
//! - [`PodcraftClient`] : appels REST typés (génération, bibliothèque)
//! - [`ProgressPoller`] : suivi de la progression d'une génération, avec
//!   annulation par [`CancellationToken`](tokio_util::sync::CancellationToken)

mod client;
pub mod error;
pub mod poller;

pub use client::{DEFAULT_TIMEOUT_SECS, PodcraftClient};
pub use error::{ClientError, Result};
pub use poller::{PollHandle, PollOutcome, PollerOptions, ProgressPoller, ProgressSource};
