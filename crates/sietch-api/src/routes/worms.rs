//! # Worm Lifecycle API
//!
//! Breeding (create), the swarm (list and get), recycling (delete) and
//! renaming. Creation runs the full admission pipeline; renaming re-applies
//! only the name rules.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sietch_core::{PageRequest, ValidationError, WormId, WormName, WormRecord};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::middleware::metrics::AdmissionOutcome;
use crate::state::AppState;
use crate::view::WormView;

/// Creation payload, as documented. The handler reads raw JSON so that each
/// field is checked in order with its own message.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWormRequest {
    /// 2 to 30 letters, digits or spaces after trimming.
    #[schema(example = "Shai Hulud")]
    pub name: String,
    /// Integer point on the timeline.
    #[schema(example = 99)]
    pub time_reference: i64,
    /// Decimal integer, `10000000000000 + timeReference`.
    #[schema(example = "10000000000099")]
    pub credential: String,
}

/// Rename payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameWormRequest {
    #[schema(example = "Muad Dib")]
    pub new_name: String,
}

/// Pagination query for the swarm listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SwarmQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 5, values above 100 are capped).
    pub limit: Option<u32>,
}

/// A message with the worm it concerns.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WormMessageResponse {
    pub message: String,
    pub data: WormView,
}

/// A single worm.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WormResponse {
    pub data: WormView,
}

/// A message alone.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// One page of the swarm.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwarmResponse {
    pub message: String,
    pub page: u32,
    pub limit: u32,
    pub total_pages: usize,
    pub total: usize,
    pub data: Vec<WormView>,
}

/// Routes reachable without a pain token.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/sietch/swarm", get(list_swarm))
        .route("/sietch/swarm/:id", get(get_worm))
}

/// Routes behind the gate.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/sietch/breed", post(breed_worm))
        .route("/sietch/recycle/:id", delete(recycle_worm))
        .route("/sietch/rename/:id", put(rename_worm))
}

/// A malformed identifier names no worm.
fn parse_worm_id(raw: &str) -> Result<WormId, AppError> {
    WormId::parse(raw).ok_or_else(|| AppError::NotFound(format!("worm {raw} does not exist")))
}

/// POST /sietch/breed: Admit a new worm.
#[utoipa::path(
    post,
    path = "/sietch/breed",
    request_body = CreateWormRequest,
    responses(
        (status = 201, description = "Worm admitted", body = WormMessageResponse),
        (status = 400, description = "Structural or temporal rejection", body = crate::error::ErrorBody),
        (status = 401, description = "No pain token", body = crate::error::ErrorBody),
        (status = 403, description = "Wrong pain token", body = crate::error::ErrorBody),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorBody),
    ),
    security(("pain_token" = [])),
    tag = "worms"
)]
async fn breed_worm(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<WormMessageResponse>), AppError> {
    let payload = match extract_json(body) {
        Ok(payload) => payload,
        Err(err) => {
            state.metrics.record_admission(AdmissionOutcome::RejectedStructural);
            return Err(err);
        }
    };

    let admitted = match state.validator.admit(&payload) {
        Ok(admitted) => admitted,
        Err(err) => {
            let outcome = if err.is_temporal() {
                AdmissionOutcome::RejectedTemporal
            } else {
                AdmissionOutcome::RejectedStructural
            };
            state.metrics.record_admission(outcome);
            tracing::info!(reason = %err, "worm refused");
            return Err(err.into());
        }
    };
    state.metrics.record_admission(AdmissionOutcome::Accepted);

    let record = state
        .worms
        .create(WormRecord::spawn(admitted, Utc::now()))
        .await?;
    tracing::info!(worm_id = %record.id, "worm admitted");

    Ok((
        StatusCode::CREATED,
        Json(WormMessageResponse {
            message: "BLESS THE MAKER. Space was folded.".to_string(),
            data: WormView::from(&record),
        }),
    ))
}

/// GET /sietch/swarm: List worms, newest first.
#[utoipa::path(
    get,
    path = "/sietch/swarm",
    params(SwarmQuery),
    responses(
        (status = 200, description = "One page of worms", body = SwarmResponse),
        (status = 400, description = "Page or limit below 1", body = crate::error::ErrorBody),
    ),
    tag = "worms"
)]
async fn list_swarm(
    State(state): State<AppState>,
    query: Result<Query<SwarmQuery>, QueryRejection>,
) -> Result<Json<SwarmResponse>, AppError> {
    let query = extract_query(query)?;
    let request = PageRequest::new(query.page, query.limit)?;
    let page = state.worms.list_page(request);

    Ok(Json(SwarmResponse {
        message: "THE SWARM IS REVEALED.".to_string(),
        page: request.page(),
        limit: request.limit(),
        total_pages: page.total_pages(),
        total: page.total,
        data: page.items.iter().map(WormView::from).collect(),
    }))
}

/// GET /sietch/swarm/:id: Fetch one worm.
#[utoipa::path(
    get,
    path = "/sietch/swarm/{id}",
    params(("id" = String, Path, description = "Worm ID")),
    responses(
        (status = 200, description = "Worm found", body = WormResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "worms"
)]
async fn get_worm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WormResponse>, AppError> {
    let id = parse_worm_id(&id)?;
    let record = state.worms.find_by_id(&id)?;
    Ok(Json(WormResponse {
        data: WormView::from(&record),
    }))
}

/// DELETE /sietch/recycle/:id: Remove a worm.
#[utoipa::path(
    delete,
    path = "/sietch/recycle/{id}",
    params(("id" = String, Path, description = "Worm ID")),
    responses(
        (status = 200, description = "Worm recycled", body = MessageResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorBody),
    ),
    security(("pain_token" = [])),
    tag = "worms"
)]
async fn recycle_worm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_worm_id(&id)?;
    state.worms.delete_by_id(&id).await?;
    tracing::info!(worm_id = %id, "worm recycled");
    Ok(Json(MessageResponse {
        message: "Water reclaimed. The tribe is strengthened.".to_string(),
    }))
}

/// PUT /sietch/rename/:id: Give a worm a new name.
#[utoipa::path(
    put,
    path = "/sietch/rename/{id}",
    params(("id" = String, Path, description = "Worm ID")),
    request_body = RenameWormRequest,
    responses(
        (status = 200, description = "Worm renamed", body = WormMessageResponse),
        (status = 400, description = "Invalid name", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorBody),
    ),
    security(("pain_token" = [])),
    tag = "worms"
)]
async fn rename_worm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<WormMessageResponse>, AppError> {
    let id = parse_worm_id(&id)?;
    let payload = extract_json(body)?;
    let name = parse_new_name(&payload)?;

    let record = state.worms.update_name_by_id(&id, name).await?;
    tracing::info!(worm_id = %id, "worm renamed");
    Ok(Json(WormMessageResponse {
        message: "The name is written.".to_string(),
        data: WormView::from(&record),
    }))
}

fn parse_new_name(payload: &Value) -> Result<WormName, ValidationError> {
    let fields = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    match fields.get("newName") {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field: "newName" }),
        Some(Value::String(s)) => WormName::new(s),
        Some(_) => Err(ValidationError::WrongType {
            field: "newName",
            expected: "a string",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_id_is_not_found() {
        assert!(matches!(parse_worm_id("not-a-uuid"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_worm_id(""), Err(AppError::NotFound(_))));
    }

    #[test]
    fn well_formed_id_parses() {
        let id = WormId::new();
        assert_eq!(parse_worm_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn new_name_is_trimmed_and_checked() {
        let name = parse_new_name(&json!({"newName": "  Muad Dib  "})).unwrap();
        assert_eq!(name.as_str(), "Muad Dib");
        assert!(matches!(
            parse_new_name(&json!({"newName": "x"})),
            Err(ValidationError::NameLength { .. })
        ));
        assert!(matches!(
            parse_new_name(&json!({"newName": "Kwisatz-Haderach"})),
            Err(ValidationError::NameCharset(_))
        ));
    }

    #[test]
    fn new_name_missing_or_mistyped() {
        assert_eq!(
            parse_new_name(&json!({})).unwrap_err(),
            ValidationError::MissingField { field: "newName" }
        );
        assert_eq!(
            parse_new_name(&json!({"newName": null})).unwrap_err(),
            ValidationError::MissingField { field: "newName" }
        );
        assert!(matches!(
            parse_new_name(&json!({"newName": 7})),
            Err(ValidationError::WrongType { field: "newName", .. })
        ));
        assert_eq!(parse_new_name(&json!([])).unwrap_err(), ValidationError::NotAnObject);
    }
}
