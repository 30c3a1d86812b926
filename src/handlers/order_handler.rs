// src/handlers/order_handler.rs
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::{
    errors::{RelayError, RelayResult},
    models::order::OrderNotification,
    services::messaging_service::PushMessage,
    state::AppState,
};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub ok: bool,
    pub message_id: String,
}

/// `POST /orders`: validate an order event and relay it as a data-only push.
pub async fn relay_order(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, RelayError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    if method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let notifier = state.notifier()?;

    if let Some(secret) = state.config.webhook_secret.as_deref() {
        verify_secret(&headers, secret)?;
    }

    if !is_json_content_type(&headers) {
        return Err(RelayError::UnsupportedContentType);
    }

    let body = body.map_err(|rejection| {
        tracing::debug!("Could not read body: {}", rejection);
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RelayError::PayloadTooLarge
        } else {
            RelayError::InvalidJsonBody
        }
    })?;
    let payload = parse_body(&body)?;
    let order = OrderNotification::from_json(&payload, &state.config.orders_topic)?;

    tracing::info!(
        order_id = %order.id(),
        status = %order.status(),
        route = %order.target.describe(),
        "Relaying order"
    );

    let message = PushMessage::from(order);
    let message_id = notifier.send(&message).await?;

    tracing::info!(%message_id, "Order relayed");
    Ok(Json(RelayResponse {
        ok: true,
        message_id,
    })
    .into_response())
}

/// `application/json` or any `+json` media type; parameters are ignored.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// An empty body reads as `{}` and then fails required-field validation.
fn parse_body(body: &[u8]) -> RelayResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejecting body: {}", e);
        RelayError::InvalidJsonBody
    })
}

fn verify_secret(headers: &HeaderMap, expected: &str) -> RelayResult<()> {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    let expected = expected.as_bytes();
    if provided.len() == expected.len() && bool::from(provided.ct_eq(expected)) {
        Ok(())
    } else {
        Err(RelayError::Unauthorized)
    }
}
