//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use campus_safety_core::domain::User;
use campus_safety_core::ports::PortError;
use std::sync::Arc;
use tracing::warn;

use crate::web::error::AppError;
use crate::web::state::AppState;

/// Header carrying the administrative shared secret.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware that verifies the bearer token and loads the caller's user record.
///
/// If valid, inserts a `CurrentUser` into request extensions for handlers to use.
/// A missing or bad token, or a user deleted since the token was issued,
/// returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract the bearer token
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthenticated("Not authenticated".to_string()))?;

    // 2. Verify signature and expiry, get user_id
    let user_id = state.tokens.verify(token).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        AppError::Unauthenticated(e.to_string())
    })?;

    // 3. Resolve the user record
    let user = state.db.get_user_by_id(user_id).await.map_err(|e| match e {
        PortError::NotFound(_) => {
            warn!("Token subject {} no longer exists", user_id);
            AppError::Unauthenticated("User not found".to_string())
        }
        other => AppError::from(other),
    })?;

    // 4. Insert the user into request extensions
    req.extensions_mut().insert(CurrentUser(user));

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

/// Middleware guarding the administrative routes.
///
/// When `ADMIN_TOKEN` is configured the request must carry it in
/// `x-admin-token`. Without it the routes stay open for demo setups.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.config.admin_token.as_deref() {
        let provided = req
            .headers()
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            warn!("Rejected administrative request to {}", req.uri().path());
            return Err(AppError::Unauthenticated("Admin token required".to_string()));
        }
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_ignored() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
