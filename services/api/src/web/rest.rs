//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the note REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::auth::{
    CredentialsRequest, LoginResponse, MeResponse, MessageResponse, RegisterResponse,
    UserSummary,
};
use crate::web::extract::JsonBody;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use notekeeper_core::domain::{Note, NotePatch};
use notekeeper_core::filter::NoteFilter;
use notekeeper_core::services::NoteInput;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::register_handler,
        crate::web::auth::confirm_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::me_handler,
        list_notes_handler,
        create_note_handler,
        update_note_handler,
        delete_note_handler,
        health_handler,
    ),
    components(
        schemas(
            CredentialsRequest,
            RegisterResponse,
            LoginResponse,
            UserSummary,
            MeResponse,
            MessageResponse,
            CreateNoteRequest,
            UpdateNoteRequest,
            NoteResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Notekeeper API", description = "Accounts and personal notes.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Optional search constraints. Every supplied constraint must match.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring of the title or content.
    pub q: Option<String>,
    /// One of `new`, `todo`, `done`.
    pub status: Option<String>,
    /// Exact category label.
    pub category: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    /// Defaults to `new`.
    pub status: Option<String>,
}

/// Only the supplied fields are changed.
#[derive(Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct NoteResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            category: note.category,
            status: note.status.to_string(),
            created_at: note.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the caller's notes, newest first, optionally filtered.
#[utoipa::path(
    get,
    path = "/notes",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching notes", body = [NoteResponse]),
        (status = 400, description = "Unknown status value"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let filter = NoteFilter::from_raw(
        params.q.as_deref(),
        params.status.as_deref(),
        params.category.as_deref(),
    )?;
    let notes = state.notes.search(&user, &filter).await?;
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

/// Create a note owned by the caller.
#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Missing field or invalid status"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    JsonBody(req): JsonBody<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = NoteInput {
        title: req.title,
        content: req.content,
        category: req.category,
        status: req.status,
    };
    let note = state.notes.create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

/// Partially update one of the caller's notes.
#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = i64, Path, description = "The note id.")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = NoteResponse),
        (status = 400, description = "Empty field or invalid status"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, ApiError> {
    let patch = NotePatch {
        title: req.title,
        content: req.content,
        category: req.category,
        status: req.status,
    };
    let note = state.notes.update(&user, id, patch).await?;
    Ok(Json(note.into()))
}

/// Delete one of the caller's notes.
#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = i64, Path, description = "The note id.")),
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.notes.delete(&user, id).await?;
    Ok(Json(MessageResponse {
        message: "Note deleted".to_string(),
    }))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
