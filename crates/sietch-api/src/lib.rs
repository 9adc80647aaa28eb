//! # sietch-api: Axum service for the sandworm breeding ground
//!
//! HTTP surface over [`sietch_core`]: the pain token gate, worm admission,
//! listing, recycling and renaming, plus operational endpoints.
//!
//! ## API Surface
//!
//! | Path                       | Module               | Gate |
//! |----------------------------|----------------------|------|
//! | `/`                        | [`routes::sietch`]   | no   |
//! | `/sietch/entry`            | [`routes::sietch`]   | yes  |
//! | `/sietch/breed`            | [`routes::worms`]    | yes  |
//! | `/sietch/swarm`, `/sietch/swarm/:id` | [`routes::worms`] | no |
//! | `/sietch/recycle/:id`      | [`routes::worms`]    | yes  |
//! | `/sietch/rename/:id`       | [`routes::worms`]    | yes  |
//! | `/health/*`, `/metrics`, `/openapi.json` | here, [`openapi`] | no |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → MetricsMiddleware → [GateMiddleware] → Handler
//! ```
//!
//! The gate is a route layer on the protected routes only, so unknown paths
//! answer 404 rather than 401.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod view;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::GateConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Request bodies beyond this size are refused before parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let gate = GateConfig {
        token: state.config.pain_token.clone(),
    };
    let metrics = state.metrics.clone();
    let metrics_on = state.config.metrics_enabled;

    let protected = Router::new()
        .merge(routes::sietch::protected_router())
        .merge(routes::worms::protected_router())
        .route_layer(from_fn(auth::pain_token_middleware));

    let mut router = Router::new()
        .merge(routes::sietch::public_router())
        .merge(routes::worms::public_router())
        .merge(protected)
        .merge(openapi::router())
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    if metrics_on {
        router = router.route("/metrics", get(prometheus_metrics));
    }

    let mut router = router.layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    // Only register the metrics middleware when metrics are enabled.
    if metrics_on {
        router = router.layer(from_fn(middleware::metrics::metrics_middleware));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(gate))
        .layer(Extension(metrics))
        .with_state(state)
}

/// GET /metrics: Prometheus metrics scrape endpoint.
///
/// Refreshes the population gauge from the store, then encodes everything
/// in Prometheus text exposition format.
async fn prometheus_metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    state.metrics.set_worms_total(state.worms.len());

    let body = state.metrics.gather_and_encode().map_err(AppError::Internal)?;
    Ok((
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
        .into_response())
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 when the configured database does not answer.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Err(e) = state.worms.ping().await {
        tracing::warn!("Database health check failed: {e}");
        return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
