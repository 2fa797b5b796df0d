//! services/api/src/web/auth.rs
//!
//! Account endpoints: registration, email confirmation, login, logout and `/me`.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::middleware::{clear_session_cookie, session_cookie, session_id, CurrentUser};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Credentials for both registration and login. Missing fields are treated as empty.
#[derive(Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    /// Only present when the server runs with `EXPOSE_CONFIRMATION_LINK=true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_link: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserSummary {
    pub email: String,
    pub confirmed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub confirmed: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create an account pending email confirmation
#[utoipa::path(
    post,
    path = "/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User registered, confirmation email written", body = RegisterResponse),
        (status = 400, description = "Email or password missing"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = state.accounts.register(&req.email, &req.password).await?;

    let response = RegisterResponse {
        message: "User registered. Please confirm your email.".to_string(),
        confirmation_link: state
            .config
            .expose_confirmation_link
            .then_some(registration.confirmation_link),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /confirm/{token} - Confirm an account with the emailed token
#[utoipa::path(
    get,
    path = "/confirm/{token}",
    params(("token" = String, Path, description = "The token from the confirmation email.")),
    responses(
        (status = 200, description = "Account confirmed", body = MessageResponse),
        (status = 400, description = "Invalid or expired confirmation token")
    )
)]
pub async fn confirm_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts.confirm(&token).await?;
    Ok(MessageResponse::new("Account confirmed, you can now login."))
}

/// POST /login - Login with a confirmed account
#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account not confirmed")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts.authenticate(&req.email, &req.password).await?;
    let session = state
        .sessions
        .establish(&user, session_id(&headers))
        .await?;

    let cookie = session_cookie(&session.id, state.sessions.ttl().num_seconds());
    info!(user_id = %user.id, "User logged in");

    let response = LoginResponse {
        message: "Login successful".to_string(),
        user: UserSummary {
            email: user.email,
            confirmed: user.confirmed,
        },
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /logout - Invalidate the current session, if any
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out; succeeds even without a session", body = MessageResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.terminate(session_id(&headers)).await?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        MessageResponse::new("Logged out successfully"),
    ))
}

/// GET /me - The currently logged-in user
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The authenticated user", body = MeResponse),
        (status = 401, description = "Not logged in or session expired")
    )
)]
pub async fn me_handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        email: user.email,
        confirmed: user.confirmed,
    })
}
