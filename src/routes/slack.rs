//! Slack webhook route handlers
//!
//! Both endpoints verify the request signature against the raw body before
//! touching the payload.

use crate::error::AppError;
use crate::slack::{command, signature, SlackError};
use crate::state::SharedState;
use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_HEADER: &str = "x-slack-signature";

fn verify_request(state: &SharedState, headers: &HeaderMap, body: &str) -> Result<(), AppError> {
    let secret = state
        .slack
        .signing_secret
        .as_deref()
        .ok_or(SlackError::NotConfigured)?;

    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let presented = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    signature::verify_signature(secret, timestamp, body.as_bytes(), presented)?;
    Ok(())
}

/// POST /api/v1/slack/commands
///
/// Slash commands are answered synchronously in the response body.
pub async fn commands(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<command::CommandResponse>, AppError> {
    verify_request(&state, &headers, &body)?;

    let cmd = command::SlashCommand::from_form(&body)?;
    Ok(Json(command::respond(&cmd)))
}

/// POST /api/v1/slack/events
///
/// Answers the url_verification challenge; all other callbacks are
/// acknowledged without processing.
pub async fn events(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, AppError> {
    verify_request(&state, &headers, &body)?;

    let payload: Value = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid event payload: {}", e)))?;

    if payload.get("type").and_then(Value::as_str) == Some("url_verification") {
        let challenge = payload
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Ok(Json(json!({ "challenge": challenge })));
    }

    Ok(Json(json!({ "ok": true })))
}
