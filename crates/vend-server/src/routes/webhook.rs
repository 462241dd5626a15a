use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use bytes::Bytes;

use crate::error::AppError;
use crate::event::WebhookPayload;
use crate::signature::SIGNATURE_HEADER;
use crate::state::AppState;

pub const ACK_MESSAGE: &str = "Webhook received and processing started";

/// POST /webhook/square: accept a Square notification.
///
/// The response goes out as soon as the event has been gated through the
/// ledger. Order lookup and dispensing happen afterwards and are only logged.
pub async fn square_webhook(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(verifier) = &app.signature {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verifier.verify(signature, &body) {
            tracing::warn!("rejecting webhook with missing or invalid signature");
            return Err(AppError::unauthorized("Invalid signature"));
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("invalid webhook payload: {e}");
        AppError::bad_request("Invalid payload")
    })?;

    tracing::info!(
        event_type = %payload.event_type,
        event_id = payload.event_id.as_deref().unwrap_or("-"),
        "received webhook"
    );

    app.pipeline.submit(payload.event());

    Ok(Json(serde_json::json!({ "message": ACK_MESSAGE })))
}
