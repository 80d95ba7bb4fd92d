//! Generation progress records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Statut d'une exécution du pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Initializing,
    Running,
    Complete,
    Error,
}

impl GenerationStatus {
    /// `complete` et `error` mettent fin au polling
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Étapes nommées du pipeline, telles qu'elles apparaissent dans `step`
pub mod steps {
    pub const SCRIPT: &str = "script";
    pub const AUDIO: &str = "audio";
    pub const COVER_ART: &str = "cover_art";
    pub const FINISHED: &str = "finished";
}

/// Current state of one podcast's generation
///
/// `progress` is a percentage in `0..=100`. The wire payload is exactly
/// `{status, step, progress, message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationProgress {
    pub status: GenerationStatus,
    pub step: String,
    pub progress: u8,
    pub message: String,
    #[serde(skip, default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl GenerationProgress {
    pub fn new(
        status: GenerationStatus,
        step: impl Into<String>,
        progress: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            step: step.into(),
            progress: progress.min(100),
            message: message.into(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_payload_has_four_fields() {
        let progress = GenerationProgress::new(
            GenerationStatus::Running,
            steps::AUDIO,
            40,
            "Generating audio",
        );
        let value = serde_json::to_value(&progress).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert_eq!(object["status"], "running");
        assert_eq!(object["step"], "audio");
        assert_eq!(object["progress"], 40);
    }

    #[test]
    fn percentage_is_clamped() {
        let progress = GenerationProgress::new(GenerationStatus::Complete, steps::FINISHED, 250, "");
        assert_eq!(progress.progress, 100);
    }

    #[test]
    fn terminal_statuses() {
        assert!(GenerationStatus::Complete.is_terminal());
        assert!(GenerationStatus::Error.is_terminal());
        assert!(!GenerationStatus::Running.is_terminal());
        assert!(!GenerationStatus::Initializing.is_terminal());
    }
}
