//! Slack integration
//!
//! Webhook-side integration only: request signature verification and slash
//! command handling. Replies go back synchronously in the HTTP response;
//! outbound message delivery is not part of this service.

pub mod command;
pub mod signature;

use crate::error::AppError;
use thiserror::Error;

/// Failures of the Slack webhook layer
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("signing secret is not configured")]
    NotConfigured,

    #[error("request timestamp is missing or invalid")]
    InvalidTimestamp,

    #[error("request timestamp is outside the allowed window")]
    StaleTimestamp,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("invalid payload: {0}")]
    BadPayload(String),
}

impl From<SlackError> for AppError {
    fn from(err: SlackError) -> Self {
        match err {
            SlackError::NotConfigured => {
                AppError::NotImplemented("Slack integration not configured".to_string())
            }
            SlackError::InvalidTimestamp
            | SlackError::StaleTimestamp
            | SlackError::SignatureMismatch => {
                tracing::warn!("Slack request rejected: {}", err);
                AppError::SlackSignature
            }
            SlackError::BadPayload(msg) => AppError::BadRequest(msg),
        }
    }
}
