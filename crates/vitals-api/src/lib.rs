//! vitals-api — HTTP surface for the vitals metric store.
//!
//! Translates the wire contract into calls on the core services. All
//! decoding, validation, and merge semantics live in `vitals-store`; the
//! handlers only map errors to status codes and shape responses.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | HTML listing of all metrics, sorted by id |
//! | POST | `/update/{kind}/{id}/{value}` | Positional update |
//! | POST | `/update/{kind}` | Missing id segment → 404 |
//! | POST | `/update` | Structured update (JSON payload) |
//! | GET | `/value/{kind}/{id}` | Plain-text formatted value |
//! | POST | `/value` | Structured single read (payload echo) |
//! | POST | `/values` | Batch read; `?detailed=true` reports misses |
//!
//! Anything else answers 400, matching the original wire contract.

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use vitals_store::{QueryService, UpdateDispatch};

/// Shared state for the handlers.
#[derive(Clone)]
pub struct ApiState {
    pub dispatch: UpdateDispatch,
    pub query: QueryService,
}

/// Build the metric server router.
pub fn build_router(dispatch: UpdateDispatch, query: QueryService) -> Router {
    let state = ApiState { dispatch, query };

    Router::new()
        .route("/", get(handlers::index))
        .route("/update", post(handlers::update_structured))
        .route("/update/{kind}", post(handlers::update_missing_id))
        .route(
            "/update/{kind}/{id}/{value}",
            post(handlers::update_positional),
        )
        .route("/value", post(handlers::read_structured))
        .route("/value/{kind}/{id}", get(handlers::read_positional))
        .route("/values", post(handlers::read_batch))
        .fallback(handlers::bad_request)
        .with_state(state)
}
