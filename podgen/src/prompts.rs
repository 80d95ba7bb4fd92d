//! Prompt templates sent to the text service

use podmodel::GenerationStyle;

const PODCAST_TEMPLATE: &str = include_str!("prompts/podcast.txt");
const DEBATE_TEMPLATE: &str = include_str!("prompts/debate.txt");
const DUCK_TEMPLATE: &str = include_str!("prompts/duck.txt");
const COVER_TEMPLATE: &str = include_str!("prompts/cover.txt");

/// Système du prompt de couverture
pub const COVER_SYSTEM_PROMPT: &str = "You are a visual artist prompt generator for AI models.";

/// Message utilisateur envoyé avec le prompt de script
pub const SCRIPT_USER_MESSAGE: &str =
    "Please convert this content to a script according to my instructions.";

/// Longueur maximale de l'extrait de script utilisé pour la couverture
pub const COVER_EXCERPT_CHARS: usize = 3000;

/// Texte de remplacement quand seules des pièces jointes sont fournies
const ATTACHED_ONLY: &str = "The source material is provided in the attached documents.";

pub fn template_for(style: GenerationStyle) -> &'static str {
    match style {
        GenerationStyle::Podcast => PODCAST_TEMPLATE,
        GenerationStyle::Debate => DEBATE_TEMPLATE,
        GenerationStyle::Duck => DUCK_TEMPLATE,
    }
}

/// System prompt for the script step
///
/// `source_text` fills `{pdf_text}`; `instructions` become the user
/// preferences block.
pub fn script_system_prompt(
    style: GenerationStyle,
    source_text: &str,
    instructions: Option<&str>,
) -> String {
    let source = if source_text.trim().is_empty() {
        ATTACHED_ONLY
    } else {
        source_text
    };

    let preferences = match instructions.map(str::trim).filter(|s| !s.is_empty()) {
        Some(message) => format!(
            "USER PREFERENCES:\n{}\n\nUse the preferences above to determine host name, guest name, title, length, tone, and whether to include intro/outro.\nIf any preferences are not specified, use reasonable defaults.",
            message
        ),
        None => "No specific preferences provided. Use default settings.".to_string(),
    };

    template_for(style)
        .replace("{pdf_text}", source)
        .replace("{user_instructions}", &preferences)
}

/// Prompt asking the text service for a cover image description
pub fn cover_prompt_request(script: &str) -> String {
    let excerpt: String = script.chars().take(COVER_EXCERPT_CHARS).collect();
    COVER_TEMPLATE.replace("{script}", &excerpt)
}

/// Description used when no better prompt is available
pub fn fallback_cover_prompt(title: &str, format: &str) -> String {
    format!("Podcast cover art for '{}' in {} style", title, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_filled() {
        let prompt = script_system_prompt(
            GenerationStyle::Debate,
            "Nuclear power is...",
            Some("Call the speakers Ada and Alan"),
        );
        assert!(prompt.contains("Nuclear power is..."));
        assert!(prompt.contains("USER PREFERENCES:\nCall the speakers Ada and Alan"));
        assert!(!prompt.contains("{pdf_text}"));
        assert!(!prompt.contains("{user_instructions}"));
    }

    #[test]
    fn missing_instructions_use_defaults() {
        let prompt = script_system_prompt(GenerationStyle::Duck, "", None);
        assert!(prompt.contains("No specific preferences provided"));
        assert!(prompt.contains("attached documents"));
    }

    #[test]
    fn cover_excerpt_is_bounded() {
        let script = "x".repeat(10_000);
        let request = cover_prompt_request(&script);
        assert!(request.len() < COVER_EXCERPT_CHARS + 1000);
    }

    #[test]
    fn fallback_mentions_title_and_format() {
        assert_eq!(
            fallback_cover_prompt("Tides", "conversational"),
            "Podcast cover art for 'Tides' in conversational style"
        );
    }
}
