//! Podcast records as stored in the library file and returned by the API

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::ModelError;

/// Durée attribuée à un fichier audio adopté sans métadonnées (5 minutes)
pub const ADOPTED_AUDIO_DURATION: u64 = 300;

/// Débit de lecture moyen utilisé pour estimer la durée d'un script
const WORDS_PER_MINUTE: f64 = 150.0;

/// Presentation format of a podcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PodcastFormat {
    Conversational,
    Debate,
    Educational,
}

impl PodcastFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversational => "conversational",
            Self::Debate => "debate",
            Self::Educational => "educational",
        }
    }

    /// Format produced by a generation style
    pub fn from_style(style: GenerationStyle) -> Self {
        match style {
            GenerationStyle::Podcast => Self::Conversational,
            GenerationStyle::Debate => Self::Debate,
            GenerationStyle::Duck => Self::Educational,
        }
    }
}

impl fmt::Display for PodcastFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PodcastFormat {
    type Err = ModelError;

    /// Accepte aussi les anciennes valeurs `podcast` et `duck`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conversational" | "podcast" => Ok(Self::Conversational),
            "debate" => Ok(Self::Debate),
            "educational" | "duck" => Ok(Self::Educational),
            _ => Err(ModelError::UnknownFormat(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for PodcastFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Script style requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStyle {
    #[default]
    Podcast,
    Debate,
    Duck,
}

impl GenerationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Podcast => "podcast",
            Self::Debate => "debate",
            Self::Duck => "duck",
        }
    }

    /// Noms par défaut des deux intervenants
    pub fn default_speaker_names(&self) -> (&'static str, &'static str) {
        match self {
            Self::Podcast => ("Host", "Guest"),
            Self::Debate => ("Debater A", "Debater B"),
            Self::Duck => ("Teacher", "Student"),
        }
    }
}

impl fmt::Display for GenerationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStyle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "podcast" => Ok(Self::Podcast),
            "debate" => Ok(Self::Debate),
            "duck" => Ok(Self::Duck),
            _ => Err(ModelError::UnknownStyle(s.to_string())),
        }
    }
}

/// A podcast in the library
///
/// Field names follow the library file: `createdAt` and `audioUrl` are
/// camel-cased while `cover_url` is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Podcast {
    pub id: String,
    pub title: String,
    pub format: PodcastFormat,
    #[serde(rename = "createdAt", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Durée en secondes
    pub duration: u64,
    /// Absent tant que l'audio n'a pas été produit
    #[serde(
        rename = "audioUrl",
        default,
        deserialize_with = "deserialize_media_url"
    )]
    pub audio_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_media_url")]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub listened: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl Podcast {
    /// Nouveau podcast créé à la fin de l'étape de script
    pub fn from_script(title: impl Into<String>, format: PodcastFormat, script: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            format,
            created_at: Utc::now(),
            duration: estimate_duration(script),
            audio_url: None,
            cover_url: None,
            listened: false,
            script: Some(script.to_string()),
        }
    }

    /// Entrée créée pour un fichier audio présent sur disque mais inconnu de la bibliothèque
    pub fn adopted_audio(stem: &str, audio_url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: format!("Audio {}", stem),
            format: PodcastFormat::Conversational,
            created_at: Utc::now(),
            duration: ADOPTED_AUDIO_DURATION,
            audio_url: Some(audio_url.into()),
            cover_url: None,
            listened: false,
            script: None,
        }
    }

    pub fn is_playable(&self) -> bool {
        self.audio_url.is_some()
    }
}

/// Estimated duration in seconds of a script read at 150 words per minute
///
/// Never less than one minute; an empty script counts as ten minutes.
pub fn estimate_duration(script: &str) -> u64 {
    let words = script.split_whitespace().count();
    if words == 0 {
        return 600;
    }
    let seconds = (words as f64 / WORDS_PER_MINUTE * 60.0) as u64;
    seconds.max(60)
}

/// RFC 3339, or a naive ISO timestamp taken as UTC
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

/// `null`, `""` and the `#` placeholder all mean "no media yet"
fn deserialize_media_url<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|url| !url.is_empty() && url != "#"))
}
