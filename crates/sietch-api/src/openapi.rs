//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the pain token header scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "pain_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-Pain-Token",
                    "Shared gate secret. Set via the PAIN_TOKEN env var.",
                ))),
            );
        }
    }
}

/// Assembled OpenAPI spec for the whole API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sietch API",
        description = "Breeding ground for sandworms.\n\nA worm is admitted only when its credential equals `10000000000000 + timeReference`. \
                       Mutating routes and `/sietch/entry` require the `X-Pain-Token` header; listing is public.",
        license(name = "BUSL-1.1")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server"),
    ),
    paths(
        crate::routes::sietch::open_sands,
        crate::routes::sietch::entry,
        crate::routes::worms::breed_worm,
        crate::routes::worms::list_swarm,
        crate::routes::worms::get_worm,
        crate::routes::worms::recycle_worm,
        crate::routes::worms::rename_worm,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::view::WormView,
            crate::routes::sietch::EntryResponse,
            crate::routes::worms::CreateWormRequest,
            crate::routes::worms::RenameWormRequest,
            crate::routes::worms::WormMessageResponse,
            crate::routes::worms::WormResponse,
            crate::routes::worms::MessageResponse,
            crate::routes::worms::SwarmResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "sietch", description = "Greeting and gated entry"),
        (name = "worms", description = "Worm admission and lifecycle"),
    )
)]
pub struct ApiDoc;

/// Router serving the generated spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
