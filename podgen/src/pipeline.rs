//! The generation pipeline: script, audio, cover art
//!
//! `POST /generate` exécute l'étape de script de façon synchrone, enregistre
//! le podcast puis rend la main ; l'audio et la couverture sont produits par
//! une tâche tokio. La progression est publiée dans un [`ProgressStore`] :
//!
//! | Statut | Étape | % |
//! |---|---|---|
//! | `initializing` | `script` | 5 |
//! | `running` | `audio` | 40, puis 45 à 88 segment par segment |
//! | `running` | `cover_art` | 90 |
//! | `complete` | `finished` | 100 |
//!
//! L'échec du script écrit `error` et interrompt tout. L'échec de l'audio
//! n'empêche pas la tentative de couverture : l'enregistrement reste
//! `running` et l'erreur n'est publiée qu'à la fin de l'exécution, une fois
//! l'id libéré. L'échec de la couverture conserve le script et l'audio déjà
//! enregistrés. Un état terminal est définitif.

use std::sync::Arc;

use podlibrary::{Library, MediaKind};
use podmodel::{
    AudioRequest, AudioResponse, CoverRequest, CoverResponse, GenerateRequest, GenerateResponse,
    GenerationProgress, GenerationStatus, Podcast, ScriptSettings, steps,
};
use podvendors::{ImageGenerator, SpeechSynthesizer, TextGenerator, TextRequest, Voice};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{GenerationError, Result},
    progress::{MemoryProgressStore, ProgressStore},
    prompts::{
        COVER_SYSTEM_PROMPT, SCRIPT_USER_MESSAGE, cover_prompt_request, fallback_cover_prompt,
        script_system_prompt,
    },
    run::{AUDIO_STEP, ActiveRuns, COVER_STEP, RunTracker, SCRIPT_STEP},
    script::{extract_title, parse_script, speakers_in_order},
    validate::{ValidatedRequest, validate_request},
    voices::assign_voices,
    wav::concat_wav,
};

/// Nombre d'intervenants quand la requête ne le précise pas
pub const DEFAULT_SPEAKERS: u8 = 2;

const COVER_PROMPT_MAX_TOKENS: u32 = 300;

const AUDIO_PROGRESS_START: u8 = 45;
const AUDIO_PROGRESS_END: u8 = 88;

/// Progression affichée après le segment `done` sur `total`
fn audio_percent(done: usize, total: usize) -> u8 {
    let span = (AUDIO_PROGRESS_END - AUDIO_PROGRESS_START) as usize;
    AUDIO_PROGRESS_START + (span * done / total.max(1)) as u8
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(GenerationError::validation(format!("{} is required", what)));
    }
    Ok(value)
}

/// Runs the generation steps against the configured services
pub struct Pipeline {
    text: Arc<dyn TextGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    images: Arc<dyn ImageGenerator>,
    library: Arc<Library>,
    progress: Arc<dyn ProgressStore>,
    voices: Vec<Voice>,
    default_speakers: u8,
    runs: ActiveRuns,
}

impl Pipeline {
    /// Crée un pipeline avec un store de progression en mémoire
    pub fn new(
        text: Arc<dyn TextGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
        images: Arc<dyn ImageGenerator>,
        library: Arc<Library>,
    ) -> Self {
        Self {
            text,
            speech,
            images,
            library,
            progress: Arc::new(MemoryProgressStore::new()),
            voices: Vec::new(),
            default_speakers: DEFAULT_SPEAKERS,
            runs: ActiveRuns::default(),
        }
    }

    pub fn with_progress_store(mut self, progress: Arc<dyn ProgressStore>) -> Self {
        self.progress = progress;
        self
    }

    /// Voix proposées aux intervenants, dans l'ordre de préférence
    pub fn with_voices(mut self, voices: Vec<Voice>) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_default_speakers(mut self, speakers: u8) -> Self {
        self.default_speakers = speakers;
        self
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    pub fn progress_store(&self) -> &Arc<dyn ProgressStore> {
        &self.progress
    }

    /// Latest progress of a podcast
    pub async fn get_progress(&self, podcast_id: &str) -> Result<GenerationProgress> {
        self.progress
            .get_progress(podcast_id)
            .await
            .ok_or_else(|| GenerationError::ProgressNotFound(podcast_id.to_string()))
    }

    /// Starts a generation run
    ///
    /// Returns once the script exists and the podcast is saved. Audio and
    /// cover art continue in the background; follow them with
    /// [`Pipeline::get_progress`].
    pub async fn generate(self: &Arc<Self>, request: &GenerateRequest) -> Result<GenerateResponse> {
        let validated = validate_request(request, self.default_speakers)?;

        let podcast_id = Uuid::new_v4().to_string();
        let guard = self.runs.begin(&podcast_id)?;
        let mut tracker = RunTracker::new(&podcast_id, self.progress.clone()).holding(guard);

        info!(
            "Generation {} started: style {}, {} document(s), {} speaker(s)",
            podcast_id,
            validated.style,
            validated.documents.len(),
            validated.speakers
        );
        tracker
            .update(
                GenerationStatus::Initializing,
                steps::SCRIPT,
                5,
                "Generating script",
            )
            .await;

        let script = self.write_script(&validated).await;
        let script = tracker.settle(&SCRIPT_STEP, script).await.into_result()?;

        let title = extract_title(&script);
        let mut podcast = Podcast::from_script(title.clone(), validated.format, &script);
        podcast.id = podcast_id.clone();
        let saved = self.library.insert(podcast).await.map_err(GenerationError::from);
        tracker.settle(&SCRIPT_STEP, saved).await.into_result()?;

        tracker
            .update(
                GenerationStatus::Running,
                steps::AUDIO,
                40,
                "Script ready, generating audio",
            )
            .await;

        let pipeline = Arc::clone(self);
        let background_script = script.clone();
        let background_id = podcast_id.clone();
        tokio::spawn(async move {
            pipeline
                .finish_run(&background_id, &background_script, tracker)
                .await;
        });

        Ok(GenerateResponse {
            success: true,
            podcast_id,
            script,
            settings_used: ScriptSettings {
                title,
                ..ScriptSettings::defaults(validated.style)
            },
            style: validated.style,
        })
    }

    /// Audio then cover art, for a run whose script is saved
    async fn finish_run(&self, podcast_id: &str, script: &str, mut tracker: RunTracker) {
        let audio = self.produce_audio(podcast_id, script, Some(&mut tracker)).await;
        tracker.settle(&AUDIO_STEP, audio).await;

        tracker
            .update(
                GenerationStatus::Running,
                steps::COVER_ART,
                90,
                "Generating cover art",
            )
            .await;

        let cover = match self.library.get(podcast_id).await {
            Ok(podcast) => self.produce_cover(&podcast, None, Some(script)).await,
            Err(e) => Err(e.into()),
        };
        tracker.settle(&COVER_STEP, cover).await;

        tracker.finish("Podcast ready").await;
        if tracker.has_failed() {
            warn!("Generation {} finished with errors", podcast_id);
        } else {
            info!("Generation {} complete", podcast_id);
        }
    }

    /// Synthesizes audio for an existing podcast (`POST /api/generate-audio`)
    ///
    /// The given script replaces the stored one when they differ.
    pub async fn generate_audio(&self, request: &AudioRequest) -> Result<AudioResponse> {
        let podcast_id = required(&request.podcast_id, "Podcast ID")?;
        let script = required(&request.script, "Script")?;
        let _guard = self.runs.begin(podcast_id)?;

        let podcast = self.library.get(podcast_id).await?;
        if podcast.script.as_deref() != Some(script) {
            self.library.update_script(podcast_id, script).await?;
        }

        let podcast = self.produce_audio(podcast_id, script, None).await?;
        Ok(AudioResponse {
            success: true,
            audio_url: podcast.audio_url.unwrap_or_default(),
            podcast_id: podcast.id,
        })
    }

    /// Generates cover art for an existing podcast (`POST /api/generate-cover`)
    ///
    /// Uses the explicit prompt if any, otherwise derives one from the given
    /// script or, failing that, from the stored script.
    pub async fn generate_cover(&self, request: &CoverRequest) -> Result<CoverResponse> {
        let podcast_id = required(&request.podcast_id, "Podcast ID")?;
        let _guard = self.runs.begin(podcast_id)?;

        let podcast = self.library.get(podcast_id).await?;
        let script = request
            .script
            .as_deref()
            .or(podcast.script.as_deref())
            .map(str::to_string);

        let podcast = self
            .produce_cover(&podcast, request.prompt.as_deref(), script.as_deref())
            .await?;
        Ok(CoverResponse {
            success: true,
            cover_url: podcast.cover_url.clone().unwrap_or_default(),
            podcast,
        })
    }

    async fn write_script(&self, request: &ValidatedRequest) -> Result<String> {
        // Les modèles de prompt supposent deux intervenants
        let instructions = match (request.instructions.as_deref(), request.speakers) {
            (instructions, DEFAULT_SPEAKERS) => instructions.map(str::to_string),
            (instructions, n) => {
                let count = format!("Write the dialogue for exactly {} speakers.", n);
                Some(match instructions {
                    Some(text) => format!("{}\n{}", text, count),
                    None => count,
                })
            }
        };

        let system = script_system_prompt(
            request.style,
            &request.source_text,
            instructions.as_deref(),
        );
        let text_request =
            TextRequest::new(system, SCRIPT_USER_MESSAGE).with_documents(request.documents.clone());

        let script = self
            .text
            .generate(text_request)
            .await
            .map_err(|e| GenerationError::vendor(steps::SCRIPT, e))?;
        info!("Script generated ({} chars)", script.len());
        Ok(script)
    }

    /// Reads every dialogue turn aloud and stores the joined WAV file
    ///
    /// Failed segments are skipped. A credit-limit failure stops synthesis
    /// and keeps what was produced so far.
    async fn produce_audio(
        &self,
        podcast_id: &str,
        script: &str,
        mut tracker: Option<&mut RunTracker>,
    ) -> Result<Podcast> {
        let turns = parse_script(script);
        if turns.is_empty() {
            return Err(GenerationError::EmptyScript);
        }

        let speakers = speakers_in_order(&turns);
        let mapping = assign_voices(&speakers, &self.voices);
        let Some(fallback) = self.voices.first() else {
            return Err(GenerationError::NoVoices);
        };

        info!(
            "Synthesizing {} line(s) for {} speaker(s)",
            turns.len(),
            speakers.len()
        );

        let total = turns.len();
        let mut segments: Vec<Vec<u8>> = Vec::with_capacity(total);
        let mut last_error = None;

        for (index, turn) in turns.iter().enumerate() {
            let voice = mapping.get(&turn.speaker).unwrap_or(fallback);
            match self.speech.synthesize(&turn.text, &voice.id).await {
                Ok(bytes) => segments.push(bytes),
                Err(e) if e.is_credit_limit() => {
                    warn!(
                        "Speech credit limit reached after {} segment(s), keeping them",
                        segments.len()
                    );
                    last_error = Some(e);
                    break;
                }
                Err(e) => {
                    warn!("Segment {} ({}) failed: {}", index + 1, turn.speaker, e);
                    last_error = Some(e);
                }
            }

            if let Some(tracker) = tracker.as_deref_mut() {
                tracker
                    .update(
                        GenerationStatus::Running,
                        steps::AUDIO,
                        audio_percent(index + 1, total),
                        &format!("Generated segment {}/{}", index + 1, total),
                    )
                    .await;
            }
        }

        if segments.is_empty() {
            if let Some(e) = last_error {
                return Err(GenerationError::vendor(steps::AUDIO, e));
            }
        }

        let merged = concat_wav(&segments)?;
        let file_name = format!("{}.wav", Uuid::new_v4());
        let podcast = self
            .library
            .attach_media(
                podcast_id,
                MediaKind::Audio,
                &file_name,
                &merged.bytes,
                Some(merged.duration_secs),
            )
            .await?;

        info!(
            "Audio for {} ready: {} of {} segment(s), {} s",
            podcast_id, merged.segments, total, merged.duration_secs
        );
        Ok(podcast)
    }

    /// Asks the text service for an image prompt; never fails
    async fn visual_prompt(&self, podcast: &Podcast, script: &str) -> String {
        let request = TextRequest::new(COVER_SYSTEM_PROMPT, cover_prompt_request(script))
            .with_max_tokens(COVER_PROMPT_MAX_TOKENS);

        match self.text.generate(request).await {
            Ok(prompt) if !prompt.trim().is_empty() => prompt.trim().to_string(),
            Ok(_) => fallback_cover_prompt(&podcast.title, podcast.format.as_str()),
            Err(e) => {
                warn!("Visual prompt generation failed, using fallback: {}", e);
                fallback_cover_prompt(&podcast.title, podcast.format.as_str())
            }
        }
    }

    async fn produce_cover(
        &self,
        podcast: &Podcast,
        prompt: Option<&str>,
        script: Option<&str>,
    ) -> Result<Podcast> {
        let prompt = prompt.map(str::trim).filter(|p| !p.is_empty());
        let script = script.map(str::trim).filter(|s| !s.is_empty());

        let visual = match (prompt, script) {
            (Some(prompt), _) => prompt.to_string(),
            (None, Some(script)) => self.visual_prompt(podcast, script).await,
            (None, None) => return Err(GenerationError::MissingCoverPrompt),
        };
        info!("Cover prompt for {}: {}", podcast.id, visual);

        let image = self
            .images
            .generate_image(&visual)
            .await
            .map_err(|e| GenerationError::vendor(steps::COVER_ART, e))?;

        let file_name = format!("{}.{}", Uuid::new_v4().simple(), image.extension);
        let updated = self
            .library
            .attach_media(&podcast.id, MediaKind::Cover, &file_name, &image.bytes, None)
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_percent_spans_45_to_88() {
        assert_eq!(audio_percent(0, 10), 45);
        assert_eq!(audio_percent(5, 10), 66);
        assert_eq!(audio_percent(10, 10), 88);
        assert_eq!(audio_percent(1, 1), 88);
    }
}
