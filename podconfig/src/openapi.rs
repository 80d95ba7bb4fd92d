//! Documentation OpenAPI de l'API de configuration

use utoipa::OpenApi;

/// Servie sur `/swagger-ui/config`
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PodCraft Configuration API",
        version = "0.1.0",
        description = "Lecture et modification de la configuration de PodCraft \
            (serveur, stockage, services de génération). Les clés `*api_key` \
            sont masquées en lecture et le masque est refusé en écriture.",
    ),
    paths(
        crate::api::get_full_config,
        crate::api::get_config_value,
        crate::api::update_config_value,
    ),
    components(
        schemas(
            crate::api::ConfigValue,
            crate::api::UpdateConfigRequest,
            crate::api::UpdateConfigResponse,
        )
    ),
    tags(
        (name = "config", description = "Réglages `host`, `storage`, `vendors` et `generation`")
    )
)]
pub struct ApiDoc;
