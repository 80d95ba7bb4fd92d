//! Extension pour intégrer l'API de configuration de podconfig dans podserver
//!
//! Le trait `ConfigExt` ajoute l'API REST de configuration au serveur.

use crate::Server;
use anyhow::Result;
use podconfig::{ApiDoc, api, get_config};
use utoipa::OpenApi;

/// Trait d'extension pour ajouter l'API de configuration à podserver
pub trait ConfigExt {
    /// Initialise l'API de configuration et enregistre les routes HTTP
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /api/config` - toute la configuration (clés API masquées)
    /// - `GET /api/config/{path}` - une valeur (ex: `host.http_port`)
    /// - `POST /api/config` - mise à jour d'une valeur
    /// - `GET /swagger-ui/config` - documentation Swagger
    async fn init_config_api(&mut self) -> Result<()>;
}

impl ConfigExt for Server {
    async fn init_config_api(&mut self) -> Result<()> {
        let api_router = api::create_router(get_config());
        self.add_openapi(api_router, ApiDoc::openapi(), "config").await;
        Ok(())
    }
}
