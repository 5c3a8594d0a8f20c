/// Session authentication middleware
///
/// Reads `Authorization: Bearer <token>`, resolves it through the
/// `SessionManager` and inserts the resulting `AuthContext` into the request
/// extensions. Handlers behind this layer take `Extension<AuthContext>`.
///
/// Any failure (missing header, bad signature, expired or revoked session,
/// deleted user) is a 401 with `{"message": "Unauthorized"}`, returned before
/// the handler runs.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::ApiError};

/// Extracts the bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
}

/// Rejects unauthenticated requests and injects `AuthContext`
pub async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let auth = state.sessions.resolve(&token).await.map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
