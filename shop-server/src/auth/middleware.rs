//! Authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;

use super::extractor::authenticate;
use crate::state::AppState;

/// Require a valid bearer token on every `/api/` route.
///
/// On success the [`CurrentUser`](super::CurrentUser) is inserted into the
/// request extensions, where the request logger and handlers pick it up.
/// CORS preflights and non-API paths (`/health`, unknown routes) pass through.
///
/// | Failure | Code | HTTP |
/// |---------|------|------|
/// | No Authorization header | NotAuthenticated | 401 |
/// | Token expired | TokenExpired | 401 |
/// | Anything else | TokenInvalid | 401 |
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS || !req.uri().path().starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let user = authenticate(req.headers(), req.uri(), &state.jwt)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
