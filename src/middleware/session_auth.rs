use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::db::AppState;
use crate::error::{AppError, Result, msg};
use crate::jwt::SESSION_COOKIE;

/// Pull the access token from `Authorization: Bearer` or, failing that,
/// the session cookie set by the auth backend's browser client.
pub fn extract_session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty())
}

/// Rejects unauthenticated requests and makes the caller available to
/// handlers as `Extension<SessionUser>`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let verifier = state.session_verifier.as_ref().ok_or_else(|| {
        tracing::error!("AUTH_JWT_SECRET is not set; cannot verify sessions");
        AppError::Configuration(msg::AUTH_NOT_CONFIGURED.into())
    })?;

    let token = extract_session_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let user = verifier.verify(token)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
