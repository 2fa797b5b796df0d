//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes, plus the session cookie helpers.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use notekeeper_core::domain::User;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// The user resolved for the current request, available to protected handlers
/// as `Extension<CurrentUser>`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Extracts the session id from the `Cookie` header, if any.
pub fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

pub fn session_cookie(session_id: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, session_id, max_age_secs
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Middleware that validates the auth session cookie and resolves the user.
///
/// If valid, inserts a `CurrentUser` into request extensions for handlers to use.
/// If invalid, expired or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Owned copies: the request body is not `Sync`, so no borrow of `req` may
    // live across the await.
    let session = session_id(req.headers()).map(str::to_owned);
    let path = req.uri().path().to_owned();
    let user = state
        .sessions
        .resolve(session.as_deref())
        .await
        .inspect_err(|e| debug!("Rejected request to {}: {}", path, e))?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
