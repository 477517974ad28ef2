//! Authentication middleware
//!
//! Extracts the bearer token from protected requests, verifies it as an
//! access token, and makes the resulting [`Identity`] available to handlers
//! through request extensions.

use crate::auth::TokenType;
use crate::error::AppError;
use crate::state::SharedState;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Verify the request's access token and attach the caller's identity.
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("authorization header is not a bearer token".to_string()))?;

    let identity = state.token_keys.verify(token, TokenType::Access)?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
