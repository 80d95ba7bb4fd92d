//! Services factices et utilitaires partagés par les tests du pipeline

#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use podgen::{MemoryProgressStore, Pipeline, ProgressStore, prompts::COVER_SYSTEM_PROMPT};
use podlibrary::{Library, MediaDirs};
use podmodel::GenerationProgress;
use podvendors::{
    GeneratedImage, ImageGenerator, SpeechSynthesizer, TextGenerator, TextRequest, Voice,
    VoiceGender, VendorError,
};
use tempfile::TempDir;
use tokio::sync::Semaphore;

pub const SCRIPT: &str = "Title: The Life of Octopuses\n\n\
    Host: Welcome! Today we talk about octopuses.\n\n\
    Guest: They have three hearts.\n\n\
    Host: And blue blood, right?\n";

pub const VISUAL_PROMPT: &str = "A watercolor octopus reading a book";

fn api_error(status: u16, message: &str) -> VendorError {
    VendorError::Api {
        service: "fake",
        status,
        message: message.to_string(),
    }
}

/// 16-bit mono PCM WAV of `seconds` of silence at 8 kHz
pub fn wav(seconds: usize) -> Vec<u8> {
    let data_len = (seconds * 8000 * 2) as u32;
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8000u32.to_le_bytes());
    out.extend_from_slice(&16000u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(out.len() + data_len as usize, 0);
    out
}

#[derive(Default)]
pub struct FakeText {
    pub fail_script: bool,
    pub requests: Mutex<Vec<TextRequest>>,
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate(&self, request: TextRequest) -> podvendors::Result<String> {
        let is_cover = request.system == COVER_SYSTEM_PROMPT;
        self.requests.lock().unwrap().push(request);
        if is_cover {
            return Ok(VISUAL_PROMPT.to_string());
        }
        if self.fail_script {
            return Err(api_error(529, "Overloaded"));
        }
        Ok(SCRIPT.to_string())
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    /// Toutes les synthèses échouent
    pub fail_all: bool,
    /// Limite de crédit atteinte après ce nombre d'appels réussis
    pub credit_after: Option<usize>,
    /// Chaque appel attend un jeton du sémaphore
    pub gate: Option<Arc<Semaphore>>,
    pub calls: AtomicUsize,
    pub voices_used: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _transcript: &str, voice_id: &str) -> podvendors::Result<Vec<u8>> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices_used.lock().unwrap().push(voice_id.to_string());

        if self.fail_all {
            return Err(api_error(500, "synthesis unavailable"));
        }
        if let Some(limit) = self.credit_after {
            if call >= limit {
                return Err(api_error(402, "Credit limit reached"));
            }
        }
        Ok(wav(1))
    }
}

#[derive(Default)]
pub struct FakeImage {
    pub fail: bool,
    /// Chaque appel attend un jeton du sémaphore
    pub gate: Option<Arc<Semaphore>>,
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageGenerator for FakeImage {
    async fn generate_image(&self, prompt: &str) -> podvendors::Result<GeneratedImage> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(api_error(503, "Model is loading"));
        }
        Ok(GeneratedImage {
            bytes: b"\x89PNG fake".to_vec(),
            extension: "png",
        })
    }
}

/// Store en mémoire qui garde l'historique des écritures
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryProgressStore,
    pub history: Mutex<Vec<GenerationProgress>>,
}

impl RecordingStore {
    pub fn percents(&self) -> Vec<u8> {
        self.history.lock().unwrap().iter().map(|p| p.progress).collect()
    }
}

#[async_trait]
impl ProgressStore for RecordingStore {
    async fn put(&self, podcast_id: &str, progress: GenerationProgress) {
        self.history.lock().unwrap().push(progress.clone());
        self.inner.put(podcast_id, progress).await;
    }

    async fn get_progress(&self, podcast_id: &str) -> Option<GenerationProgress> {
        self.inner.get_progress(podcast_id).await
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub library: Arc<Library>,
    pub text: Arc<FakeText>,
    pub speech: Arc<FakeSpeech>,
    pub images: Arc<FakeImage>,
    pub store: Arc<RecordingStore>,
    pub pipeline: Arc<Pipeline>,
}

pub fn voices() -> Vec<Voice> {
    vec![
        Voice::new("voice-m", VoiceGender::Male, "Newsman"),
        Voice::new("voice-f", VoiceGender::Female, "Calm Lady"),
    ]
}

pub async fn harness(text: FakeText, speech: FakeSpeech, images: FakeImage) -> Harness {
    let dir = TempDir::new().unwrap();
    let media = MediaDirs::new(dir.path().join("audio"), dir.path().join("covers"));
    let library = Arc::new(Library::open(dir.path().join("data"), media).await.unwrap());

    let text = Arc::new(text);
    let speech = Arc::new(speech);
    let images = Arc::new(images);
    let store = Arc::new(RecordingStore::default());

    let pipeline = Pipeline::new(
        text.clone(),
        speech.clone(),
        images.clone(),
        library.clone(),
    )
    .with_progress_store(store.clone())
    .with_voices(voices());

    Harness {
        dir,
        library,
        text,
        speech,
        images,
        store,
        pipeline: Arc::new(pipeline),
    }
}

/// Attend que la génération atteigne un statut terminal
pub async fn wait_terminal(pipeline: &Pipeline, podcast_id: &str) -> GenerationProgress {
    for _ in 0..500 {
        if let Ok(progress) = pipeline.get_progress(podcast_id).await {
            if progress.is_terminal() {
                return progress;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("generation {} did not finish", podcast_id);
}

/// Attend que la génération publie `step` (ou s'arrête avant)
pub async fn wait_for_step(pipeline: &Pipeline, podcast_id: &str, step: &str) -> GenerationProgress {
    for _ in 0..500 {
        if let Ok(progress) = pipeline.get_progress(podcast_id).await {
            if progress.step == step || progress.is_terminal() {
                return progress;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("generation {} never reached {}", podcast_id, step);
}

pub fn pdf_base64() -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n")
}
