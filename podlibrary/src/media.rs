//! Media directories and their public URLs
//!
//! Audio lives under `/static/audio/{file}` and covers under
//! `/static/covers/{file}`; the file name is the last URL segment.

use std::path::{Path, PathBuf};

use crate::error::{LibraryError, Result};

pub const AUDIO_URL_PREFIX: &str = "/static/audio/";
pub const COVERS_URL_PREFIX: &str = "/static/covers/";

/// Extensions reconnues comme fichiers audio lors de la réconciliation
pub const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "ogg", "m4a"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Cover,
}

impl MediaKind {
    pub fn url_prefix(&self) -> &'static str {
        match self {
            Self::Audio => AUDIO_URL_PREFIX,
            Self::Cover => COVERS_URL_PREFIX,
        }
    }
}

/// Refuse les noms contenant un séparateur, `..` ou commençant par un point
pub fn check_file_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..");
    if valid {
        Ok(())
    } else {
        Err(LibraryError::InvalidFileName(name.to_string()))
    }
}

/// Public URL of a media file
pub fn media_url(kind: MediaKind, file_name: &str) -> String {
    format!("{}{}", kind.url_prefix(), file_name)
}

/// File name referenced by a local media URL, if the URL is one
pub fn file_name_from_url(kind: MediaKind, url: &str) -> Option<&str> {
    url.strip_prefix(kind.url_prefix())
        .filter(|name| !name.is_empty() && !name.contains('/'))
}

/// Nom sans extension
pub fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Non-hidden file with a known audio extension
pub fn is_audio_file_name(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// MIME type served for a media file
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Audio and cover directories on disk
#[derive(Debug, Clone)]
pub struct MediaDirs {
    pub audio: PathBuf,
    pub covers: PathBuf,
}

impl MediaDirs {
    pub fn new(audio: impl Into<PathBuf>, covers: impl Into<PathBuf>) -> Self {
        Self {
            audio: audio.into(),
            covers: covers.into(),
        }
    }

    pub fn dir(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Cover => &self.covers,
        }
    }

    /// Chemin d'un fichier média, après validation du nom
    pub fn path(&self, kind: MediaKind, file_name: &str) -> Result<PathBuf> {
        check_file_name(file_name)?;
        Ok(self.dir(kind).join(file_name))
    }
}
