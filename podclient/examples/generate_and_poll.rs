//! Génère un podcast à partir d'un PDF et suit sa progression
//!
//! ```text
//! cargo run -p podclient --example generate_and_poll -- document.pdf [http://localhost:6000]
//! ```

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use podclient::{PodcraftClient, PollOutcome, PollerOptions, ProgressPoller};
use podmodel::GenerateRequest;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let Some(pdf) = args.next() else {
        bail!("usage: generate_and_poll <file.pdf> [base_url]");
    };
    let base_url = args
        .next()
        .unwrap_or_else(|| "http://localhost:6000".to_string());

    let bytes = tokio::fs::read(&pdf)
        .await
        .with_context(|| format!("cannot read {}", pdf))?;

    let client = Arc::new(PodcraftClient::new(base_url)?);
    let response = client
        .generate(&GenerateRequest {
            files: vec![STANDARD.encode(bytes)],
            mode: Some("summaritive".to_string()),
            ..Default::default()
        })
        .await?;
    info!(
        "Podcast {} created: {}",
        response.podcast_id, response.settings_used.title
    );

    let poller = ProgressPoller::new(client.clone(), PollerOptions::default());
    let handle = poller.spawn(response.podcast_id.clone(), |p| {
        info!("[{:>3}%] {} - {}", p.progress, p.step, p.message);
    });

    match handle.outcome().await {
        PollOutcome::Completed(_) => {
            let podcast = client.get_podcast(&response.podcast_id).await?;
            info!(
                "Done: audio {:?}, cover {:?}",
                podcast.audio_url, podcast.cover_url
            );
        }
        PollOutcome::Failed { step, message } => {
            info!("Generation ended with an error at {}: {}", step, message);
            let podcast = client.get_podcast(&response.podcast_id).await?;
            info!("Partial podcast kept: audio {:?}", podcast.audio_url);
        }
        PollOutcome::Cancelled => info!("Polling cancelled"),
        PollOutcome::Exhausted { .. } => info!("Still running, giving up polling"),
    }
    Ok(())
}
