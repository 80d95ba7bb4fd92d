//! REST handlers exposing the configuration tree
//!
//! Secrets (keys ending in `api_key`) are masked in every response.

use crate::Config;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

const MASK: &str = "********";

/// Structure pour récupérer une valeur de configuration
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConfigValue {
    /// Chemin de la clé (ex: "host.http_port")
    pub path: String,
    /// Valeur au format JSON
    pub value: JsonValue,
}

/// Structure pour mettre à jour une valeur de configuration
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateConfigRequest {
    /// Chemin de la clé (ex: "vendors.llm.model")
    pub path: String,
    /// Nouvelle valeur au format JSON
    pub value: JsonValue,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateConfigResponse {
    pub success: bool,
    pub message: String,
}

/// Erreur renvoyée par les handlers, sérialisée en `{"error": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    fn bad_request(message: impl ToString) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err: anyhow::Error = err.into();
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

/// Découpe "host.http_port" en segments non vides
fn split_path(path: &str) -> Result<Vec<&str>, ApiError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(ApiError::bad_request(format!(
            "Invalid configuration path '{}'",
            path
        )));
    }
    Ok(parts)
}

/// GET /api/config - Récupérer toute la configuration
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "config",
    responses(
        (status = 200, description = "Configuration complète", body = serde_json::Value)
    )
)]
async fn get_full_config(State(config): State<Arc<Config>>) -> Result<Json<JsonValue>, ApiError> {
    let tree = serde_json::to_value(config.get_value(&[])?)?;
    Ok(Json(mask_secrets(tree, None)))
}

/// GET /api/config/{path} - Récupérer une valeur à un chemin spécifique
#[utoipa::path(
    get,
    path = "/api/config/{path}",
    tag = "config",
    params(
        ("path" = String, Path, description = "Chemin séparé par des points, ex: vendors.llm.model")
    ),
    responses(
        (status = 200, description = "Valeur de configuration", body = ConfigValue),
        (status = 400, description = "Chemin mal formé"),
        (status = 404, description = "Chemin non trouvé")
    )
)]
async fn get_config_value(
    State(config): State<Arc<Config>>,
    Path(path): Path<String>,
) -> Result<Json<ConfigValue>, ApiError> {
    let parts = split_path(&path)?;
    let value = config
        .get_value(&parts)
        .map_err(|e| ApiError::new(StatusCode::NOT_FOUND, e))?;
    let value = mask_secrets(serde_json::to_value(value)?, parts.last().copied());

    Ok(Json(ConfigValue { value, path }))
}

/// POST /api/config - Mettre à jour une valeur de configuration
///
/// Le masque renvoyé par les lectures n'est jamais enregistré à la place
/// d'une clé.
#[utoipa::path(
    post,
    path = "/api/config",
    tag = "config",
    request_body = UpdateConfigRequest,
    responses(
        (status = 200, description = "Configuration mise à jour", body = UpdateConfigResponse),
        (status = 400, description = "Chemin ou valeur refusés")
    )
)]
async fn update_config_value(
    State(config): State<Arc<Config>>,
    Json(request): Json<UpdateConfigRequest>,
) -> Result<Json<UpdateConfigResponse>, ApiError> {
    let parts = split_path(&request.path)?;
    if request.value.as_str() == Some(MASK) {
        return Err(ApiError::bad_request(
            "Refusing to store a masked value; send the real secret",
        ));
    }

    config.set_value(&parts, serde_yaml::to_value(&request.value)?)?;

    Ok(Json(UpdateConfigResponse {
        success: true,
        message: format!("Configuration updated at path: {}", request.path),
    }))
}

fn is_secret_key(key: &str) -> bool {
    key.ends_with("api_key")
}

/// Remplace les valeurs secrètes non vides par un masque
fn mask_secrets(value: JsonValue, key: Option<&str>) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let masked = mask_secrets(v, Some(&k));
                    (k, masked)
                })
                .collect(),
        ),
        JsonValue::String(s) if key.is_some_and(is_secret_key) && !s.is_empty() => {
            JsonValue::String(MASK.to_string())
        }
        other => other,
    }
}

/// Crée le router API pour la configuration
///
/// Les routes sont relatives : le serveur les monte sous `/api/config`.
pub fn create_router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/", get(get_full_config).post(update_config_value))
        .route("/{path}", get(get_config_value))
        .with_state(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_keys_are_masked() {
        let value = serde_json::json!({
            "vendors": {"llm": {"api_key": "sk-secret", "model": "m"}, "tts": {"api_key": ""}}
        });
        let masked = mask_secrets(value, None);
        assert_eq!(masked["vendors"]["llm"]["api_key"], MASK);
        assert_eq!(masked["vendors"]["llm"]["model"], "m");
        assert_eq!(masked["vendors"]["tts"]["api_key"], "");
    }

    #[test]
    fn empty_path_segments_are_rejected() {
        assert!(split_path("host.http_port").is_ok());
        assert_eq!(
            split_path("host..port").unwrap_err().status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn leaf_secret_is_masked() {
        let masked = mask_secrets(JsonValue::String("abc".into()), Some("api_key"));
        assert_eq!(masked, MASK);
    }
}
