//! Voice assignment for the speakers of a script

use std::collections::HashMap;

use podvendors::{Voice, VoiceGender};
use tracing::info;

/// Maps each speaker to a voice
///
/// - one speaker gets the first voice;
/// - two speakers get the first male and the first female voice, so the
///   two parts are easy to tell apart (falling back to the first two voices
///   when one gender is missing);
/// - more speakers are served round-robin over the whole list.
///
/// Returns an empty map when no voice is configured.
pub fn assign_voices(speakers: &[String], voices: &[Voice]) -> HashMap<String, Voice> {
    let mut mapping = HashMap::new();
    if voices.is_empty() || speakers.is_empty() {
        return mapping;
    }

    match speakers.len() {
        1 => {
            mapping.insert(speakers[0].clone(), voices[0].clone());
        }
        2 => {
            let first_of = |gender| voices.iter().find(|v| v.gender == gender);
            let (a, b) = match (
                first_of(VoiceGender::Male),
                first_of(VoiceGender::Female),
            ) {
                (Some(male), Some(female)) => (male, female),
                _ => (&voices[0], &voices[1 % voices.len()]),
            };
            mapping.insert(speakers[0].clone(), a.clone());
            mapping.insert(speakers[1].clone(), b.clone());
        }
        _ => {
            for (i, speaker) in speakers.iter().enumerate() {
                mapping.insert(speaker.clone(), voices[i % voices.len()].clone());
            }
        }
    }

    for speaker in speakers {
        if let Some(voice) = mapping.get(speaker) {
            info!("  {}: {}", speaker, voice);
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<Voice> {
        vec![
            Voice::new("m1", VoiceGender::Male, "Newsman"),
            Voice::new("m2", VoiceGender::Male, "Reading Man"),
            Voice::new("f1", VoiceGender::Female, "Calm Lady"),
        ]
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_speaker_uses_first_voice() {
        let mapping = assign_voices(&names(&["Narrator"]), &voices());
        assert_eq!(mapping["Narrator"].id, "m1");
    }

    #[test]
    fn two_speakers_get_contrasting_voices() {
        let mapping = assign_voices(&names(&["Host", "Guest"]), &voices());
        assert_eq!(mapping["Host"].id, "m1");
        assert_eq!(mapping["Guest"].id, "f1");
    }

    #[test]
    fn two_speakers_without_female_voice() {
        let only_male = vec![
            Voice::new("m1", VoiceGender::Male, "A"),
            Voice::new("m2", VoiceGender::Male, "B"),
        ];
        let mapping = assign_voices(&names(&["Host", "Guest"]), &only_male);
        assert_eq!(mapping["Host"].id, "m1");
        assert_eq!(mapping["Guest"].id, "m2");
    }

    #[test]
    fn many_speakers_round_robin() {
        let mapping = assign_voices(&names(&["A", "B", "C", "D"]), &voices());
        assert_eq!(mapping["A"].id, "m1");
        assert_eq!(mapping["C"].id, "f1");
        assert_eq!(mapping["D"].id, "m1");
    }

    #[test]
    fn no_voices_no_mapping() {
        assert!(assign_voices(&names(&["A"]), &[]).is_empty());
    }
}
