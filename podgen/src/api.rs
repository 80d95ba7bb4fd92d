//! API REST de génération

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use podmodel::{
    AudioRequest, AudioResponse, CoverRequest, CoverResponse, ErrorResponse, GenerateRequest,
    GenerateResponse, GenerationProgress, steps,
};
use tracing::{error, warn};
use utoipa::OpenApi;

use crate::{Pipeline, error::GenerationError};

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            GenerationError::Library(e) => return e.into_response(),
            GenerationError::ProgressNotFound(_) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse::new("No progress found for this podcast")),
                )
                    .into_response();
            }
            GenerationError::Validation(_) | GenerationError::MissingCoverPrompt => {
                (StatusCode::BAD_REQUEST, "Invalid request")
            }
            GenerationError::EmptyScript => (StatusCode::BAD_REQUEST, "Invalid script"),
            GenerationError::AlreadyRunning(_) => (StatusCode::CONFLICT, "Generation in progress"),
            GenerationError::Vendor { step, .. } => {
                warn!("{} step failed: {}", step, self);
                let error = match step {
                    steps::SCRIPT => "Failed to generate script",
                    steps::AUDIO => "Failed to generate audio",
                    _ => "Failed to generate cover art",
                };
                (StatusCode::BAD_GATEWAY, error)
            }
            GenerationError::Audio(_) => {
                warn!("{}", self);
                (StatusCode::BAD_GATEWAY, "Failed to generate audio")
            }
            GenerationError::NoVoices => {
                error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Speech service not configured")
            }
        };
        (
            status,
            Json(ErrorResponse::with_message(error, self.to_string())),
        )
            .into_response()
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, GenerationError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| GenerationError::validation(rejection.body_text()))
}

/// Lance une génération
///
/// Le script est produit avant la réponse ; l'audio et la couverture
/// suivent en arrière-plan (voir `/api/audio-progress/{podcast_id}`).
#[utoipa::path(
    post,
    path = "/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Script generated, audio and cover art started", body = GenerateResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Text service failure", body = ErrorResponse)
    ),
    tag = "generation"
)]
pub async fn generate(
    State(pipeline): State<Arc<Pipeline>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };
    match pipeline.generate(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/generate-audio",
    request_body = AudioRequest,
    responses(
        (status = 200, description = "Audio stored", body = AudioResponse),
        (status = 400, description = "Missing podcast id or script", body = ErrorResponse),
        (status = 404, description = "Unknown podcast", body = ErrorResponse),
        (status = 409, description = "A generation is running for this podcast", body = ErrorResponse),
        (status = 502, description = "Speech service failure", body = ErrorResponse)
    ),
    tag = "generation"
)]
pub async fn generate_audio(
    State(pipeline): State<Arc<Pipeline>>,
    body: Result<Json<AudioRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };
    match pipeline.generate_audio(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/generate-cover",
    request_body = CoverRequest,
    responses(
        (status = 200, description = "Cover stored", body = CoverResponse),
        (status = 400, description = "Neither prompt nor script available", body = ErrorResponse),
        (status = 404, description = "Unknown podcast", body = ErrorResponse),
        (status = 502, description = "Image service failure", body = ErrorResponse)
    ),
    tag = "generation"
)]
pub async fn generate_cover(
    State(pipeline): State<Arc<Pipeline>>,
    body: Result<Json<CoverRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };
    match pipeline.generate_cover(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Progression d'une génération
#[utoipa::path(
    get,
    path = "/api/audio-progress/{podcast_id}",
    params(("podcast_id" = String, Path, description = "Podcast id")),
    responses(
        (status = 200, description = "Latest progress record", body = GenerationProgress),
        (status = 404, description = "Nothing recorded for this id", body = ErrorResponse)
    ),
    tag = "generation"
)]
pub async fn audio_progress(
    State(pipeline): State<Arc<Pipeline>>,
    Path(podcast_id): Path<String>,
) -> Response {
    match pipeline.get_progress(&podcast_id).await {
        Ok(progress) => Json(progress).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PodCraft Generation API",
        version = "0.1.0",
        description = "Génération de podcasts : script, audio multi-voix et couverture",
    ),
    paths(generate, generate_audio, generate_cover, audio_progress),
    components(schemas(
        GenerateRequest,
        GenerateResponse,
        AudioRequest,
        AudioResponse,
        CoverRequest,
        CoverResponse,
        GenerationProgress,
        ErrorResponse,
        podmodel::ScriptSettings,
        podmodel::GenerationStyle,
        podmodel::GenerationStatus,
    )),
    tags(
        (name = "generation", description = "Pipeline de génération")
    )
)]
pub struct ApiDoc;
