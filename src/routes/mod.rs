//! HTTP route handlers for the probe endpoints.
//!
//! Both routes answer in plain text and are marked `no-store` so that no cache
//! between the caller and the probe can hide a failing database.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod exercise;
pub mod ping;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_NO_STORE;
use crate::middleware::request_id_layer;
use crate::pool::Session;
use crate::state::AppState;

/// Creates the Axum router with the probe routes.
pub fn create_router<S: Session>(state: AppState<S>) -> Router {
    let probe_routes = Router::new()
        .route("/ping", get(ping::ping::<S>))
        .route("/test", get(exercise::test::<S>))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ));

    Router::new()
        .merge(probe_routes)
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
