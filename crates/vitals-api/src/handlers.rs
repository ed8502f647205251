//! HTTP handlers for the metric server.
//!
//! Status mapping follows the wire contract: validation errors answer 400,
//! except the empty-id case which answers 404; unknown ids and kind
//! mismatches answer 404; persistence failures under write-through answer
//! 500. Error bodies are the plain error message.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::warn;

use vitals_store::{MetricKind, MetricPayload, MetricQuery, StoreError};

use crate::ApiState;

fn error_response(err: &StoreError) -> Response {
    let status = match err {
        StoreError::EmptyId | StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        _ => {
            warn!(error = %err, "persistence failure surfaced to caller");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string()).into_response()
}

// ── Updates ────────────────────────────────────────────────────

/// POST /update/{kind}/{id}/{value}
pub async fn update_positional(
    State(state): State<ApiState>,
    Path((kind, id, value)): Path<(String, String, String)>,
) -> Response {
    match state.dispatch.apply_positional(&kind, &id, &value) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /update/{kind} — the id segment is missing. A recognized kind
/// answers 404 (incomplete update), anything else stays a 400.
pub async fn update_missing_id(Path(kind): Path<String>) -> Response {
    match MetricKind::parse(&kind) {
        Some(_) => error_response(&StoreError::EmptyId),
        None => error_response(&StoreError::UnknownKind(kind)),
    }
}

/// POST /update — structured body.
pub async fn update_structured(
    State(state): State<ApiState>,
    Json(payload): Json<MetricPayload>,
) -> Response {
    match state.dispatch.apply_structured(payload) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error_response(&e),
    }
}

// ── Reads ──────────────────────────────────────────────────────

/// GET /value/{kind}/{id} — plain-text formatted value.
pub async fn read_positional(
    State(state): State<ApiState>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    // An unrecognized kind cannot match any stored record.
    let Some(kind) = MetricKind::parse(&kind) else {
        return error_response(&StoreError::NotFound(id));
    };
    match state.query.get_one(&id, kind) {
        Ok(value) => value.into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /value — structured single read, echoing the record.
pub async fn read_structured(
    State(state): State<ApiState>,
    Json(request): Json<MetricQuery>,
) -> Response {
    let Some(kind) = MetricKind::parse(&request.kind) else {
        return error_response(&StoreError::NotFound(request.id));
    };
    match state.query.get_record(&request.id, kind) {
        Ok(record) => Json(MetricPayload::from(record)).into_response(),
        Err(e) => error_response(&e),
    }
}

#[derive(Deserialize)]
pub struct BatchParams {
    #[serde(default)]
    detailed: bool,
}

/// POST /values — batch read. Lenient by default: misses are silently
/// omitted. With `?detailed=true` the misses are reported alongside.
pub async fn read_batch(
    State(state): State<ApiState>,
    Query(params): Query<BatchParams>,
    Json(requests): Json<Vec<MetricQuery>>,
) -> Response {
    if params.detailed {
        let (matched, missed) = state.query.batch_get_detailed(&requests);
        Json(serde_json::json!({ "matched": matched, "missed": missed })).into_response()
    } else {
        Json(state.query.batch_get(&requests)).into_response()
    }
}

/// GET / — all metrics as an HTML listing, sorted by id.
pub async fn index(State(state): State<ApiState>) -> Html<String> {
    let rows: Vec<String> = state
        .query
        .get_all()
        .into_iter()
        .map(|(id, _, value)| format!("<div>{id} = {value}</div>"))
        .collect();
    Html(format!(
        "<html><head><title>Metrics</title></head><body><h1>Metrics</h1>\n{}\n</body></html>",
        rows.join("\n")
    ))
}

/// Fallback: every unmatched route answers 400.
pub async fn bad_request() -> StatusCode {
    StatusCode::BAD_REQUEST
}
