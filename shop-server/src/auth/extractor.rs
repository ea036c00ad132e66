//! JWT Auth Extractor
//!
//! Yields [`CurrentUser`] in handlers. Reuses the identity attached by
//! [`require_auth`](super::middleware::require_auth) and validates the bearer
//! token itself when the middleware did not run.

use axum::{extract::FromRequestParts, http::request::Parts};
use http::{HeaderMap, Uri};
use shared::error::AppError;

use super::{CurrentUser, JwtError, JwtService};
use crate::state::AppState;

/// Validate the `Authorization: Bearer <token>` header
pub(crate) fn authenticate(
    headers: &HeaderMap,
    uri: &Uri,
    jwt: &JwtService,
) -> Result<CurrentUser, AppError> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            tracing::warn!(uri = %uri, "Missing authorization header");
            return Err(AppError::not_authenticated());
        }
    };

    let claims = jwt.validate_token(token).map_err(|e| {
        tracing::warn!(error = %e, uri = %uri, "Token rejected");
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {e}")))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(&parts.headers, &parts.uri, &state.jwt)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
