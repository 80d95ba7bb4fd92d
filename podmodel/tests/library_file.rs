use podmodel::{GenerationStyle, Podcast, PodcastFormat, PodcastList, ScriptSettings};
use serde_json::json;

#[test]
fn legacy_library_entries_load() {
    let raw = json!({
        "podcasts": [
            {
                "id": "8f0c3c9e-6f1b-4b61-9a57-3c1d2b1f0a11",
                "title": "Audio interview",
                "format": "podcast",
                "createdAt": "2025-03-02T14:05:11.482913",
                "duration": 300,
                "audioUrl": "#",
                "cover_url": null,
                "listened": false
            },
            {
                "id": "e1a7",
                "title": "Photosynthesis",
                "format": "duck",
                "createdAt": "2025-03-04T09:00:00Z",
                "duration": 412,
                "audioUrl": "/static/audio/e1a7.wav",
                "script": "Teacher: Hello"
            }
        ]
    });

    let list: PodcastList = serde_json::from_value(raw).unwrap();
    assert_eq!(list.podcasts.len(), 2);

    let first = &list.podcasts[0];
    assert_eq!(first.format, PodcastFormat::Conversational);
    assert!(!first.is_playable());
    assert_eq!(first.script, None);

    let second = &list.podcasts[1];
    assert_eq!(second.format, PodcastFormat::Educational);
    assert_eq!(second.audio_url.as_deref(), Some("/static/audio/e1a7.wav"));
    assert!(!second.listened);
}

#[test]
fn podcast_serialises_with_library_keys() {
    let podcast = Podcast::from_script("Rust ownership", PodcastFormat::Debate, "A: one two three");
    let value = serde_json::to_value(&podcast).unwrap();

    assert_eq!(value["format"], "debate");
    assert!(value.get("createdAt").is_some());
    assert!(value.get("audioUrl").unwrap().is_null());
    assert!(value.get("cover_url").unwrap().is_null());
    assert_eq!(value["duration"], 60);

    let back: Podcast = serde_json::from_value(value).unwrap();
    assert_eq!(back.id, podcast.id);
    assert_eq!(back.created_at, podcast.created_at);
}

#[test]
fn adopted_audio_defaults() {
    let podcast = Podcast::adopted_audio("episode-3", "/static/audio/episode-3.mp3");
    assert_eq!(podcast.title, "Audio episode-3");
    assert_eq!(podcast.format, PodcastFormat::Conversational);
    assert_eq!(podcast.duration, 300);
}

#[test]
fn default_settings_per_style() {
    let debate = ScriptSettings::defaults(GenerationStyle::Debate);
    assert_eq!(debate.host_name, "Debater A");
    assert_eq!(debate.guest_name, "Debater B");
    assert_eq!(debate.title, "PDF Discussion");
    assert_eq!(debate.length_in_minutes, 15);
    assert!(debate.include_intro_outro);

    let duck = ScriptSettings::defaults(GenerationStyle::Duck);
    assert_eq!((duck.host_name.as_str(), duck.guest_name.as_str()), ("Teacher", "Student"));
}
