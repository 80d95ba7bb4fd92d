//! # Module Server - API de haut niveau pour Axum
//!
//! Ce module fournit une abstraction simple pour créer le serveur HTTP de
//! PodCraft, en cachant la configuration du routage et des middlewares.
//!
//! ## Fonctionnalités
//!
//! - **Routes JSON simples** : endpoints API avec `add_route()`
//! - **Sous-routers** : `add_router()` pour les extensions (bibliothèque, génération)
//! - **Documentation API** : OpenAPI/Swagger avec `add_openapi()` et `add_documented_router()`
//! - **CORS et limite de taille** : appliqués au démarrage depuis la configuration
//! - **Arrêt gracieux** : sur Ctrl+C

use crate::logs::{LogState, LoggingOptions, LogsApiDoc, create_logs_router, init_logging};
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use podconfig::get_config;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const DEFAULT_SERVER_NAME: &str = "PodCraft";

/// Info serveur sérialisable
#[derive(Clone, Serialize, utoipa::ToSchema)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub http_port: u16,
}

/// Serveur principal
pub struct Server {
    name: String,
    base_url: String,
    http_port: u16,
    cors_origin: Option<String>,
    body_limit: usize,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
    log_state: Option<LogState>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `base_url` - URL de base (ex: "http://localhost")
    /// * `http_port` - Port HTTP à écouter
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            cors_origin: None,
            body_limit: 20 * 1024 * 1024,
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
            log_state: None,
        }
    }

    pub fn new_configured() -> Self {
        ServerBuilder::new_configured().build()
    }

    /// Ajoute une route JSON dynamique
    ///
    /// La closure fournie est appelée à chaque requête GET sur le chemin.
    ///
    /// ```rust,no_run
    /// # use podserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "http://localhost", 3000);
    /// server.add_route("/info", || async {
    ///     serde_json::json!({"version": "0.1.0"})
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };

        self.mount(path, Router::new().route("/", get(handler))).await;
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let normalized = format!("/{}", path.trim_start_matches('/'));
        self.mount(&normalized, sub_router).await;
    }

    async fn mount(&mut self, path: &str, route: Router) {
        let mut r = self.router.write().await;
        *r = if path == "/" {
            std::mem::take(&mut *r).merge(route)
        } else {
            std::mem::take(&mut *r).nest(path, route)
        };
    }

    /// Ajoute une API documentée avec OpenAPI et Swagger UI
    ///
    /// Le `api_router` est nesté sous `/api/{name}`. La documentation est
    /// servie sur `/swagger-ui/{name}` et la spécification sur
    /// `/api-docs/{name}.json`.
    pub async fn add_openapi(
        &mut self,
        api_router: Router,
        openapi: utoipa::openapi::OpenApi,
        name: &str,
    ) {
        let base_path = format!("/api/{}", name);
        let nested_router = Router::new().nest(&base_path, api_router);
        self.add_documented_router(nested_router, openapi, name).await;
    }

    /// Ajoute un router monté à la racine, accompagné de sa documentation
    ///
    /// Contrairement à [`Server::add_openapi`], les chemins du router sont
    /// conservés tels quels (ex: `/generate`, `/api/audio-progress/{id}`).
    pub async fn add_documented_router(
        &mut self,
        router: Router,
        openapi: utoipa::openapi::OpenApi,
        name: &str,
    ) {
        let swagger = SwaggerUi::new(format!("/swagger-ui/{}", name))
            .url(format!("/api-docs/{}.json", name), openapi);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(router).merge(swagger);
    }

    /// Router complet avec les middlewares (CORS, limite de taille)
    ///
    /// Utilisé par [`Server::start`] et par les tests qui envoient des
    /// requêtes directement au router.
    pub async fn router(&self) -> Router {
        let mut router = self
            .router
            .read()
            .await
            .clone()
            .layer(DefaultBodyLimit::max(self.body_limit));

        if let Some(origin) = &self.cors_origin {
            match origin.parse::<HeaderValue>() {
                Ok(origin) => {
                    router = router.layer(
                        CorsLayer::new()
                            .allow_origin(origin)
                            .allow_methods([
                                Method::GET,
                                Method::POST,
                                Method::PUT,
                                Method::DELETE,
                            ])
                            .allow_headers(Any),
                    );
                }
                Err(e) => warn!("Invalid CORS origin '{}': {}", origin, e),
            }
        }

        router
    }

    /// Démarre le serveur HTTP
    ///
    /// Lance le serveur sur le port configuré et met en place la gestion
    /// de Ctrl+C pour un arrêt gracieux. Échoue si le port ne peut pas être
    /// ouvert.
    pub async fn start(&mut self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(
            "Server {} running at {}:{}",
            self.name, self.base_url, self.http_port
        );

        let router = self.router().await;
        self.join_handle = Some(tokio::spawn(async move {
            let shutdown = async {
                if let Err(e) = signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
                info!("Ctrl+C reçu, arrêt gracieux");
            };

            if let Err(e) = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("HTTP server stopped with error: {}", e);
            }
        }));

        Ok(())
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            http_port: self.http_port,
        }
    }

    /// État du système de logs, si [`Server::init_logging`] a été appelé
    pub fn log_state(&self) -> Option<LogState> {
        self.log_state.clone()
    }

    /// Initialise le système de logging et enregistre les routes de logs
    ///
    /// Routes enregistrées : `GET /api/logs/dump`, `GET|POST /api/logs/log_setup`.
    pub async fn init_logging(&mut self, options: LoggingOptions) {
        let log_state = init_logging(options);

        self.add_openapi(
            create_logs_router(log_state.clone()),
            LogsApiDoc::openapi(),
            "logs",
        )
        .await;

        self.log_state = Some(log_state);
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
    cors_origin: Option<String>,
    body_limit: Option<usize>,
}

impl ServerBuilder {
    /// Crée un nouveau builder
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            cors_origin: None,
            body_limit: None,
        }
    }

    /// Builder initialisé depuis `podconfig`
    pub fn new_configured() -> Self {
        let config = get_config();
        let body_mb = config.get_max_body_mb().unwrap_or(20);
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            base_url: config.get_base_url(),
            http_port: config.get_http_port(),
            cors_origin: Some(config.get_cors_origin()),
            body_limit: Some(body_mb * 1024 * 1024),
        }
    }

    /// Origine autorisée pour les requêtes navigateur
    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = Some(origin.into());
        self
    }

    /// Taille maximale d'un corps de requête, en octets
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = Some(bytes);
        self
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        let mut server = Server::new(self.name, self.base_url, self.http_port);
        server.cors_origin = self.cors_origin;
        if let Some(limit) = self.body_limit {
            server.body_limit = limit;
        }
        server
    }
}
