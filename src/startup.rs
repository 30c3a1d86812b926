// src/startup.rs
use axum::{
    http::{header, HeaderValue, Request},
    routing::any,
    Router,
};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{handlers::order_handler, state::AppState};

pub const ALLOWED_HEADERS: &str = "Content-Type, x-webhook-secret";
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Method checks live in the handler so OPTIONS and 405 answer uniformly
        .route("/orders", any(order_handler::relay_order))
        .route("/order", any(order_handler::relay_order))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}
