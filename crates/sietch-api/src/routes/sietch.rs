//! Greeting and gated entry.

use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Reply to a caller who passed the gate.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub message: String,
    #[schema(example = "10 Liters")]
    pub water_reward: String,
}

/// Routes reachable without a pain token.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(open_sands))
}

/// Routes behind the gate.
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/sietch/entry", get(entry))
}

/// GET /: Greeting for the open sands.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Greeting", body = String)),
    tag = "sietch"
)]
async fn open_sands() -> &'static str {
    "You stand on the open sands. The Worm does not sense you... yet."
}

/// GET /sietch/entry: Welcome for those who endured the box.
#[utoipa::path(
    get,
    path = "/sietch/entry",
    responses(
        (status = 200, description = "Gate passed", body = EntryResponse),
        (status = 401, description = "No pain token", body = crate::error::ErrorBody),
        (status = 403, description = "Wrong pain token", body = crate::error::ErrorBody),
    ),
    security(("pain_token" = [])),
    tag = "sietch"
)]
async fn entry() -> Json<EntryResponse> {
    Json(EntryResponse {
        message: "Welcome, Usul. We have been waiting for you.".to_string(),
        water_reward: "10 Liters".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn open_sands_greets_in_plain_text() {
        let app = public_router().with_state(AppState::new());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(std::str::from_utf8(&body).unwrap().contains("open sands"));
    }

    #[tokio::test]
    async fn entry_pays_water() {
        let app = protected_router().with_state(AppState::new());
        let response = app
            .oneshot(Request::builder().uri("/sietch/entry").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["waterReward"], "10 Liters");
    }
}
