//! Error types for the podcast library

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, LibraryError>;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// IO error on the library file or a media file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The library file is not valid JSON
    #[error("Library file is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Podcast not found: {0}")]
    NotFound(String),

    #[error("Title must not be empty")]
    EmptyTitle,

    /// Media file names must be plain, non-hidden names
    #[error("Invalid media file name: {0}")]
    InvalidFileName(String),
}

impl LibraryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
