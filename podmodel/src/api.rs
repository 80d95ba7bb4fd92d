//! Request and response bodies of the REST API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{GenerationStyle, Podcast};

/// Titre utilisé quand le script n'en fournit pas
pub const DEFAULT_TITLE: &str = "PDF Discussion";

/// Body of `POST /generate`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Sujet de recherche ou instructions de l'utilisateur
    #[serde(default)]
    pub context: Option<String>,
    /// Documents PDF encodés en base64
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub mode: Option<String>,
    /// `podcast`, `debate` ou `duck`
    #[serde(default)]
    pub style: Option<String>,
    /// Texte source brut
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub speakers: Option<u8>,
}

/// Settings the script was generated with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScriptSettings {
    pub title: String,
    pub host_name: String,
    pub guest_name: String,
    pub length_in_minutes: u32,
    pub tone: String,
    pub include_intro_outro: bool,
}

impl ScriptSettings {
    pub fn defaults(style: GenerationStyle) -> Self {
        let (host, guest) = style.default_speaker_names();
        Self {
            title: DEFAULT_TITLE.to_string(),
            host_name: host.to_string(),
            guest_name: guest.to_string(),
            length_in_minutes: 15,
            tone: "conversational".to_string(),
            include_intro_outro: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    pub podcast_id: String,
    pub script: String,
    pub settings_used: ScriptSettings,
    pub style: GenerationStyle,
}

/// Body of `POST /api/generate-audio`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AudioRequest {
    pub podcast_id: String,
    pub script: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AudioResponse {
    pub success: bool,
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
    pub podcast_id: String,
}

/// Body of `POST /api/generate-cover`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CoverRequest {
    pub podcast_id: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CoverResponse {
    pub success: bool,
    pub cover_url: String,
    pub podcast: Podcast,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PodcastList {
    pub podcasts: Vec<Podcast>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PodcastEnvelope {
    pub podcast: Podcast,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenameRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// JSON error body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}
