// logs.rs
mod buffer_layer;

pub use buffer_layer::BufferLayer;

use std::{
    collections::VecDeque,
    sync::{Arc, RwLock},
    time::SystemTime,
};

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use podconfig::Config;
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Représente une entrée de log
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Buffer circulaire partagé
#[derive(Clone)]
pub struct LogState {
    buffer: Arc<RwLock<VecDeque<LogEntry>>>,
    capacity: usize,
    max_level: Arc<RwLock<Level>>,
    reload_handle: Option<Arc<reload::Handle<LevelFilter, Registry>>>,
}

impl LogState {
    /// Buffer sans filtre rechargeable (tests, outils)
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            max_level: Arc::new(RwLock::new(Level::TRACE)),
            reload_handle: None,
        }
    }

    fn with_reload_handle(
        capacity: usize,
        level: Level,
        handle: reload::Handle<LevelFilter, Registry>,
    ) -> Self {
        let mut state = Self::new(capacity);
        *state.max_level.write().unwrap() = level;
        state.reload_handle = Some(Arc::new(handle));
        state
    }

    pub fn set_max_level(&self, level: Level) {
        *self.max_level.write().unwrap() = level;

        if let Some(handle) = &self.reload_handle {
            if let Err(e) = handle.reload(LevelFilter::from_level(level)) {
                tracing::warn!("Failed to reload log level filter: {}", e);
            }
        }
    }

    pub fn get_max_level(&self) -> Level {
        *self.max_level.read().unwrap()
    }

    pub(crate) fn push(&self, entry: LogEntry) {
        let mut buf = self.buffer.write().unwrap();
        while buf.len() >= self.capacity {
            buf.pop_front();
        }
        buf.push_back(entry);
    }

    pub fn dump(&self) -> Vec<LogEntry> {
        self.buffer.read().unwrap().iter().cloned().collect()
    }
}

/// Query params pour /api/logs/dump
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct LogQuery {
    /// Niveau minimum (ERROR, WARN, INFO, DEBUG, TRACE)
    #[serde(default)]
    pub level: Option<String>,
    /// Filtre par mot-clé sur le message ou la cible
    #[serde(default)]
    pub search: Option<String>,
}

/// Handler REST (dump JSON du buffer)
#[utoipa::path(
    get,
    path = "/api/logs/dump",
    params(LogQuery),
    responses(
        (status = 200, description = "Buffered log entries")
    ),
    tag = "logs"
)]
pub async fn log_dump(
    State(state): State<LogState>,
    Query(params): Query<LogQuery>,
) -> impl IntoResponse {
    let min_level = params.level.as_deref().and_then(string_to_level);
    let entries: Vec<LogEntry> = state
        .dump()
        .into_iter()
        .filter(|entry| filter_entry(entry, min_level, params.search.as_deref()))
        .collect();
    Json(entries)
}

/// Vérifie si une entrée passe les filtres de niveau et de mot-clé
fn filter_entry(entry: &LogEntry, min_level: Option<Level>, search: Option<&str>) -> bool {
    if let Some(max) = min_level {
        match string_to_level(&entry.level) {
            // Level::ERROR est le plus "petit" : un log passe s'il est au moins aussi sévère
            Some(level) if level <= max => {}
            _ => return false,
        }
    }

    match search {
        Some(s) => entry.message.contains(s) || entry.target.contains(s),
        None => true,
    }
}

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Capacité du buffer circulaire (nombre d'entrées conservées)
    pub buffer_capacity: usize,
    /// Activer la sortie console
    pub enable_console: bool,
    /// Niveau initial
    pub min_level: Level,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            enable_console: true,
            min_level: Level::INFO,
        }
    }
}

impl LoggingOptions {
    /// Lit `host.logger.*` dans la configuration
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            buffer_capacity: config
                .get_log_cache_size()
                .unwrap_or(defaults.buffer_capacity),
            enable_console: config
                .get_log_enable_console()
                .unwrap_or(defaults.enable_console),
            min_level: config
                .get_log_min_level()
                .ok()
                .and_then(|l| string_to_level(&l))
                .unwrap_or(defaults.min_level),
        }
    }
}

/// Initialise le système de logging : filtre rechargeable, buffer, console
///
/// Si un subscriber global est déjà installé, le buffer reste utilisable
/// mais ne reçoit rien ; un avertissement est émis.
pub fn init_logging(options: LoggingOptions) -> LogState {
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::from_level(options.min_level));

    let log_state =
        LogState::with_reload_handle(options.buffer_capacity, options.min_level, reload_handle);

    // Le filtre doit être appliqué avant le BufferLayer
    let subscriber = Registry::default()
        .with(filter)
        .with(BufferLayer::new(log_state.clone()));

    let result = if options.enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = result {
        tracing::warn!("Logging already initialised: {}", e);
    }

    log_state
}

/// Request body pour la configuration du logging
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LogSetupRequest {
    pub level: String,
}

/// Response pour la configuration du logging
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LogSetupResponse {
    pub current_level: String,
    pub available_levels: Vec<String>,
}

const AVAILABLE_LEVELS: [&str; 5] = ["ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

fn setup_response(level: Level) -> LogSetupResponse {
    LogSetupResponse {
        current_level: level.to_string(),
        available_levels: AVAILABLE_LEVELS.iter().map(|l| l.to_string()).collect(),
    }
}

/// Handler pour GET /api/logs/log_setup - retourne la configuration actuelle
#[utoipa::path(
    get,
    path = "/api/logs/log_setup",
    responses(
        (status = 200, description = "Log configuration retrieved successfully", body = LogSetupResponse)
    ),
    tag = "logs"
)]
pub async fn log_setup_get(State(state): State<LogState>) -> impl IntoResponse {
    Json(setup_response(state.get_max_level()))
}

/// Handler pour POST /api/logs/log_setup - met à jour le niveau de log
#[utoipa::path(
    post,
    path = "/api/logs/log_setup",
    request_body = LogSetupRequest,
    responses(
        (status = 200, description = "Log level updated successfully", body = LogSetupResponse),
        (status = 400, description = "Invalid log level")
    ),
    tag = "logs"
)]
pub async fn log_setup_post(
    State(state): State<LogState>,
    Json(payload): Json<LogSetupRequest>,
) -> impl IntoResponse {
    let Some(level) = string_to_level(&payload.level) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Invalid log level. Must be one of: ERROR, WARN, INFO, DEBUG, TRACE"
            })),
        )
            .into_response();
    };

    state.set_max_level(level);
    tracing::info!("Log level changed to: {}", level);

    (StatusCode::OK, Json(setup_response(level))).into_response()
}

pub(crate) fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// Crée le router pour l'API de gestion des logs
pub fn create_logs_router(log_state: LogState) -> axum::Router {
    use axum::routing::get;
    axum::Router::new()
        .route("/dump", get(log_dump))
        .route("/log_setup", get(log_setup_get).post(log_setup_post))
        .with_state(log_state)
}

/// API OpenAPI pour la gestion des logs
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        log_dump,
        log_setup_get,
        log_setup_post,
    ),
    components(
        schemas(LogSetupRequest, LogSetupResponse)
    ),
    tags(
        (name = "logs", description = "Log buffer and level endpoints")
    )
)]
pub struct LogsApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: SystemTime::now(),
            level: level.to_string(),
            target: "podgen::pipeline".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn buffer_drops_oldest_entries() {
        let state = LogState::new(2);
        state.push(entry("INFO", "one"));
        state.push(entry("INFO", "two"));
        state.push(entry("INFO", "three"));

        let messages: Vec<_> = state.dump().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn level_filter_keeps_more_severe_entries() {
        assert!(filter_entry(&entry("ERROR", "x"), Some(Level::WARN), None));
        assert!(filter_entry(&entry("WARN", "x"), Some(Level::WARN), None));
        assert!(!filter_entry(&entry("DEBUG", "x"), Some(Level::WARN), None));
    }

    #[test]
    fn search_matches_message_or_target() {
        assert!(filter_entry(&entry("INFO", "cover art failed"), None, Some("cover")));
        assert!(filter_entry(&entry("INFO", "x"), None, Some("pipeline")));
        assert!(!filter_entry(&entry("INFO", "x"), None, Some("audio")));
    }

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!(string_to_level("debug"), Some(Level::DEBUG));
        assert_eq!(string_to_level(" Warn "), Some(Level::WARN));
        assert_eq!(string_to_level("verbose"), None);
    }
}
