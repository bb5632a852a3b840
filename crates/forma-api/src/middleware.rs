use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate the session token from the Authorization header.
/// On success the decoded `Claims` are available to handlers as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("Missing bearer token"))?;

    let claims = state.tokens.verify(token.trim()).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized("Invalid or expired token")
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
