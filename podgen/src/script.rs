//! Script parsing: from the text service's reply to dialogue turns
//!
//! Les scripts produits commencent souvent par des notes de préparation
//! (`<script_planning>...</script_planning>`) et des lignes de métadonnées
//! (`Title: ...`, `Tone: ...`). Seuls les tours de parole sont conservés.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use podmodel::DEFAULT_TITLE;

/// `[Name]: text` ou `Name: text` (le nom s'arrête au premier `:`)
static SPEAKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(.*?)\]:\s*(.*)$|^([^\[\]]+?):\s*(.*)$").expect("valid speaker regex")
});

static CLOSING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</[^>]+>").expect("valid closing tag regex"));

static TITLE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<title>\s*(.*?)\s*</title>").expect("valid title tag regex")
});

static TITLE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[#*\s]*title[*\s]*:[*\s]*(.+?)[*\s]*$").expect("valid title line regex")
});

/// Mots qui signalent une ligne de métadonnées plutôt qu'un intervenant
const METADATA_KEYWORDS: [&str; 9] = [
    "title",
    "guest",
    "tone",
    "length",
    "format",
    "topic",
    "desired",
    "include",
    "conversational",
];

/// Noms de rôle qui contiennent un mot-clé mais restent des intervenants
const ROLE_NAMES: [&str; 1] = ["guest"];

const MAX_SPEAKER_NAME_CHARS: usize = 30;

/// One turn of dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

fn is_metadata_speaker(name: &str) -> bool {
    let lower = name.to_lowercase();
    if name.chars().count() > MAX_SPEAKER_NAME_CHARS {
        return true;
    }
    if ROLE_NAMES.contains(&lower.as_str()) {
        return false;
    }
    METADATA_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Splits a speaker line into `(name, text)`
fn speaker_line(line: &str) -> Option<(&str, &str)> {
    let caps = SPEAKER_LINE.captures(line)?;
    let (name, text) = match (caps.get(1), caps.get(2)) {
        (Some(name), Some(text)) => (name, text),
        _ => (caps.get(3)?, caps.get(4)?),
    };
    Some((name.as_str().trim(), text.as_str().trim()))
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("//") || line.starts_with("/*")
}

/// Parses a generated script into dialogue turns
///
/// Rules:
/// - everything up to and including the first closing tag (`</...>`) is dropped;
/// - leading lines before the first speaker line are dropped;
/// - a blank line ends the current turn;
/// - lines starting with `#`, `//` or `/*` are ignored;
/// - metadata "speakers" (`Title:`, `Tone:`...) and names longer than 30
///   characters are dropped together with their text;
/// - other lines continue the current turn, joined with spaces.
pub fn parse_script(script: &str) -> Vec<DialogueLine> {
    let body = match CLOSING_TAG.find(script) {
        Some(m) => script[m.end()..].trim(),
        None => script,
    };

    let lines: Vec<&str> = body.lines().collect();
    let start = lines
        .iter()
        .position(|l| speaker_line(l.trim()).is_some())
        .unwrap_or(0);

    let mut turns = Vec::new();
    let mut speaker: Option<String> = None;
    let mut text: Vec<String> = Vec::new();

    let mut flush = |speaker: &Option<String>, text: &mut Vec<String>| {
        if let Some(name) = speaker {
            if !text.is_empty() {
                turns.push(DialogueLine {
                    speaker: name.clone(),
                    text: text.join(" "),
                });
            }
        }
        text.clear();
    };

    for raw in &lines[start..] {
        let line = raw.trim();
        if line.is_empty() {
            flush(&speaker, &mut text);
            continue;
        }
        if is_comment(line) {
            continue;
        }

        if let Some((name, first)) = speaker_line(line) {
            flush(&speaker, &mut text);
            if is_metadata_speaker(name) {
                speaker = None;
                continue;
            }
            speaker = Some(name.to_string());
            if !first.is_empty() {
                text.push(first.to_string());
            }
        } else if speaker.is_some() {
            text.push(line.to_string());
        }
    }
    flush(&speaker, &mut text);

    turns
}

/// Distinct speakers, in order of first appearance
pub fn speakers_in_order(turns: &[DialogueLine]) -> Vec<String> {
    let mut speakers: Vec<String> = Vec::new();
    for turn in turns {
        if !speakers.contains(&turn.speaker) {
            speakers.push(turn.speaker.clone());
        }
    }
    speakers
}

/// Title announced by the script, or `PDF Discussion`
///
/// Looks for a `Title:` line, then a `<title>` tag, then the first
/// markdown heading.
pub fn extract_title(script: &str) -> String {
    let clean = |s: &str| {
        s.trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '*')
            .trim()
            .to_string()
    };

    let from_line = script
        .lines()
        .find_map(|l| TITLE_LINE.captures(l.trim()))
        .and_then(|c| c.get(1).map(|m| clean(m.as_str())));

    let from_tag = || {
        TITLE_TAG
            .captures(script)
            .and_then(|c| c.get(1).map(|m| clean(m.as_str())))
    };

    let from_heading = || {
        script.lines().map(str::trim).find_map(|l| {
            let heading = l.strip_prefix('#')?.trim_start_matches('#');
            Some(clean(heading))
        })
    };

    from_line
        .filter(|t| !t.is_empty())
        .or_else(|| from_tag().filter(|t| !t.is_empty()))
        .or_else(|| from_heading().filter(|t| !t.is_empty()))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}
