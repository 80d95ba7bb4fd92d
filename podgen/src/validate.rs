//! Validation of `POST /generate` bodies

use base64::{Engine, engine::general_purpose::STANDARD};
use podmodel::{GenerateRequest, GenerationStyle, PodcastFormat};

use crate::error::{GenerationError, Result};

/// Seul mode accepté par `/generate`
pub const SUPPORTED_MODE: &str = "summaritive";

const PDF_MAGIC: &[u8] = b"%PDF";

pub const MIN_SPEAKERS: u8 = 1;
pub const MAX_SPEAKERS: u8 = 4;

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub style: GenerationStyle,
    pub format: PodcastFormat,
    /// Texte source brut (`content`)
    pub source_text: String,
    /// Consignes de l'utilisateur (`context`)
    pub instructions: Option<String>,
    /// PDF encodés en base64, tels que reçus
    pub documents: Vec<String>,
    pub speakers: u8,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Checks one base64 document and returns it without surrounding blanks
///
/// Accepts an optional `data:...;base64,` prefix.
fn check_document(index: usize, encoded: &str) -> Result<String> {
    let trimmed = encoded.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => trimmed,
    };

    let bytes = STANDARD.decode(payload).map_err(|e| {
        GenerationError::validation(format!("File {} is not valid base64: {}", index + 1, e))
    })?;

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(GenerationError::validation(format!(
            "File {} is not a PDF document",
            index + 1
        )));
    }
    Ok(payload.to_string())
}

/// Validates a generation request
///
/// `default_speakers` is used when the request does not say how many
/// voices it wants.
pub fn validate_request(
    request: &GenerateRequest,
    default_speakers: u8,
) -> Result<ValidatedRequest> {
    if let Some(mode) = non_blank(&request.mode) {
        if mode != SUPPORTED_MODE {
            return Err(GenerationError::validation(format!(
                "Unsupported mode '{}': only '{}' requests are processed",
                mode, SUPPORTED_MODE
            )));
        }
    }

    let style = match non_blank(&request.style) {
        Some(style) => style
            .parse::<GenerationStyle>()
            .map_err(|e| GenerationError::validation(e.to_string()))?,
        None => GenerationStyle::default(),
    };

    let source_text = non_blank(&request.content).unwrap_or_default();
    let instructions = non_blank(&request.context);
    let files: Vec<&String> = request.files.iter().filter(|f| !f.trim().is_empty()).collect();

    if source_text.is_empty() && instructions.is_none() && files.is_empty() {
        return Err(GenerationError::validation(
            "Provide at least one of 'content', 'files' or 'context'",
        ));
    }

    let documents = files
        .iter()
        .enumerate()
        .map(|(i, f)| check_document(i, f))
        .collect::<Result<Vec<_>>>()?;

    let speakers = request.speakers.unwrap_or(default_speakers);
    if !(MIN_SPEAKERS..=MAX_SPEAKERS).contains(&speakers) {
        return Err(GenerationError::validation(format!(
            "'speakers' must be between {} and {} (got {})",
            MIN_SPEAKERS, MAX_SPEAKERS, speakers
        )));
    }

    Ok(ValidatedRequest {
        style,
        format: PodcastFormat::from_style(style),
        source_text,
        instructions,
        documents,
        speakers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_base64() -> String {
        STANDARD.encode(b"%PDF-1.4\n%fake document")
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            files: vec![pdf_base64()],
            mode: Some("summaritive".to_string()),
            ..Default::default()
        }
    }

    fn message(result: Result<ValidatedRequest>) -> String {
        match result {
            Err(GenerationError::Validation(message)) => message,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn defaults_are_applied() {
        let validated = validate_request(&request(), 2).unwrap();
        assert_eq!(validated.style, GenerationStyle::Podcast);
        assert_eq!(validated.format, PodcastFormat::Conversational);
        assert_eq!(validated.speakers, 2);
        assert_eq!(validated.documents.len(), 1);
        assert!(validated.instructions.is_none());
    }

    #[test]
    fn style_selects_format() {
        let mut req = request();
        req.style = Some("duck".to_string());
        assert_eq!(
            validate_request(&req, 2).unwrap().format,
            PodcastFormat::Educational
        );

        req.style = Some("opera".to_string());
        assert!(message(validate_request(&req, 2)).contains("Invalid style"));
    }

    #[test]
    fn only_summaritive_mode() {
        let mut req = request();
        req.mode = Some("extractive".to_string());
        assert!(message(validate_request(&req, 2)).contains("summaritive"));

        req.mode = None;
        assert!(validate_request(&req, 2).is_ok());
    }

    #[test]
    fn some_source_is_required() {
        let req = GenerateRequest {
            content: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(message(validate_request(&req, 2)).contains("at least one"));

        let topic_only = GenerateRequest {
            context: Some("The history of tea".to_string()),
            ..Default::default()
        };
        let validated = validate_request(&topic_only, 2).unwrap();
        assert_eq!(validated.instructions.as_deref(), Some("The history of tea"));
    }

    #[test]
    fn files_must_be_pdf() {
        let mut req = request();
        req.files = vec!["***".to_string()];
        assert!(message(validate_request(&req, 2)).contains("base64"));

        req.files = vec![STANDARD.encode(b"PK\x03\x04 zip")];
        assert!(message(validate_request(&req, 2)).contains("not a PDF"));

        req.files = vec![format!("data:application/pdf;base64,{}", pdf_base64())];
        assert_eq!(validate_request(&req, 2).unwrap().documents, vec![pdf_base64()]);
    }

    #[test]
    fn speaker_count_is_bounded() {
        let mut req = request();
        req.speakers = Some(0);
        assert!(message(validate_request(&req, 2)).contains("between 1 and 4"));
        req.speakers = Some(5);
        assert!(validate_request(&req, 2).is_err());
        req.speakers = Some(4);
        assert_eq!(validate_request(&req, 2).unwrap().speakers, 4);
    }
}
