//! API REST de la bibliothèque de podcasts

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use podmodel::{DeleteResponse, ErrorResponse, PodcastEnvelope, PodcastList, RenameRequest};
use tracing::{error, warn};
use utoipa::OpenApi;

use crate::{
    Library,
    error::LibraryError,
    media::{MediaKind, content_type_for},
};

impl IntoResponse for LibraryError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            LibraryError::NotFound(_) => (StatusCode::NOT_FOUND, "Podcast not found"),
            LibraryError::EmptyTitle => (StatusCode::BAD_REQUEST, "Invalid title"),
            LibraryError::InvalidFileName(_) => (StatusCode::NOT_FOUND, "File not found"),
            LibraryError::Io(_) | LibraryError::Json(_) => {
                error!("Library error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Library unavailable")
            }
        };
        (
            status,
            Json(ErrorResponse::with_message(error, self.to_string())),
        )
            .into_response()
    }
}

/// Liste tous les podcasts
///
/// Les fichiers audio présents sur disque mais inconnus sont ajoutés à la
/// bibliothèque avant la réponse.
#[utoipa::path(
    get,
    path = "/api/podcasts",
    responses(
        (status = 200, description = "All podcasts", body = PodcastList),
        (status = 500, description = "Library unavailable", body = ErrorResponse)
    ),
    tag = "podcasts"
)]
pub async fn list_podcasts(State(library): State<Arc<Library>>) -> Response {
    match library.list().await {
        Ok(podcasts) => Json(PodcastList { podcasts }).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/podcasts/{id}",
    params(("id" = String, Path, description = "Podcast id")),
    responses(
        (status = 200, description = "The podcast", body = PodcastEnvelope),
        (status = 404, description = "Unknown podcast", body = ErrorResponse)
    ),
    tag = "podcasts"
)]
pub async fn get_podcast(
    State(library): State<Arc<Library>>,
    Path(id): Path<String>,
) -> Response {
    match library.get(&id).await {
        Ok(podcast) => Json(PodcastEnvelope { podcast }).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/podcasts/{id}",
    params(("id" = String, Path, description = "Podcast id")),
    responses(
        (status = 200, description = "Podcast deleted", body = DeleteResponse),
        (status = 404, description = "Unknown podcast", body = ErrorResponse)
    ),
    tag = "podcasts"
)]
pub async fn delete_podcast(
    State(library): State<Arc<Library>>,
    Path(id): Path<String>,
) -> Response {
    match library.delete(&id).await {
        Ok(_) => Json(DeleteResponse {
            success: true,
            message: "Podcast deleted successfully".to_string(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/podcasts/{id}/title",
    params(("id" = String, Path, description = "Podcast id")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Podcast renamed", body = PodcastEnvelope),
        (status = 400, description = "Empty title", body = ErrorResponse),
        (status = 404, description = "Unknown podcast", body = ErrorResponse)
    ),
    tag = "podcasts"
)]
pub async fn rename_podcast(
    State(library): State<Arc<Library>>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Response {
    match library.rename(&id, &req.title).await {
        Ok(podcast) => Json(PodcastEnvelope { podcast }).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/podcasts/{id}/listened",
    params(("id" = String, Path, description = "Podcast id")),
    responses(
        (status = 200, description = "Listened flag toggled", body = PodcastEnvelope),
        (status = 404, description = "Unknown podcast", body = ErrorResponse)
    ),
    tag = "podcasts"
)]
pub async fn toggle_listened(
    State(library): State<Arc<Library>>,
    Path(id): Path<String>,
) -> Response {
    match library.toggle_listened(&id).await {
        Ok(podcast) => Json(PodcastEnvelope { podcast }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn serve_media_file(library: &Library, kind: MediaKind, file: &str) -> Response {
    let path = match library.media().path(kind, file) {
        Ok(path) => path,
        Err(_) => return (StatusCode::NOT_FOUND, "File not found").into_response(),
    };

    match tokio::fs::read(&path).await {
        Ok(data) => (
            StatusCode::OK,
            [("content-type", content_type_for(file))],
            data,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("File not found: {:?}", path);
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
        Err(e) => {
            warn!("Error reading file {:?}: {}", path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error reading file").into_response()
        }
    }
}

/// Handler pour GET /static/audio/{file}
pub async fn serve_audio(
    State(library): State<Arc<Library>>,
    Path(file): Path<String>,
) -> Response {
    serve_media_file(&library, MediaKind::Audio, &file).await
}

/// Handler pour GET /static/covers/{file}
pub async fn serve_cover(
    State(library): State<Arc<Library>>,
    Path(file): Path<String>,
) -> Response {
    serve_media_file(&library, MediaKind::Cover, &file).await
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PodCraft Library API",
        version = "0.1.0",
        description = "Bibliothèque des podcasts générés",
    ),
    paths(
        list_podcasts,
        get_podcast,
        delete_podcast,
        rename_podcast,
        toggle_listened,
    ),
    components(schemas(
        PodcastList,
        PodcastEnvelope,
        RenameRequest,
        DeleteResponse,
        ErrorResponse,
        podmodel::Podcast,
        podmodel::PodcastFormat,
    )),
    tags(
        (name = "podcasts", description = "Gestion de la bibliothèque de podcasts")
    )
)]
pub struct ApiDoc;
