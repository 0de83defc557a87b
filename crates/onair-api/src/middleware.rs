use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Operator routes require `Authorization: Bearer <admin token>`.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.settings.admin_token.as_str();
    if expected.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    if token != expected {
        warn!("Rejected operator request to {}", req.uri().path());
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}
