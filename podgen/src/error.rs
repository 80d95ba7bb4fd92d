//! Error types for the generation pipeline

use podlibrary::LibraryError;
use podvendors::VendorError;

use crate::wav::WavError;

/// Result type alias for generation operations
pub type Result<T> = std::result::Result<T, GenerationError>;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The request is malformed (400)
    #[error("{0}")]
    Validation(String),

    /// A vendor call failed during a step
    #[error("{source}")]
    Vendor {
        step: &'static str,
        #[source]
        source: VendorError,
    },

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("No progress recorded for podcast {0}")]
    ProgressNotFound(String),

    /// A run is already in flight for this podcast
    #[error("Generation already running for podcast {0}")]
    AlreadyRunning(String),

    #[error("Audio assembly failed: {0}")]
    Audio(#[from] WavError),

    #[error("The script contains no dialogue")]
    EmptyScript,

    #[error("No voice configured for the speech service")]
    NoVoices,

    #[error("Either 'prompt' or 'script' is required")]
    MissingCoverPrompt,
}

impl GenerationError {
    pub fn vendor(step: &'static str, source: VendorError) -> Self {
        Self::Vendor { step, source }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ProgressNotFound(_) => true,
            Self::Library(e) => e.is_not_found(),
            _ => false,
        }
    }
}
