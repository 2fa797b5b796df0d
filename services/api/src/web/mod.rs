pub mod auth;
pub mod extract;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use auth::{confirm_handler, login_handler, logout_handler, me_handler, register_handler};
use rest::{
    create_note_handler, delete_note_handler, health_handler, list_notes_handler,
    update_note_handler, ApiDoc,
};
use state::AppState;

pub use middleware::require_auth;

/// Builds the complete application router: public account routes, session
/// protected routes, and the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/register", post(register_handler))
        .route("/confirm/{token}", get(confirm_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/health", get(health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/me", get(me_handler))
        .route("/notes", get(list_notes_handler).post(create_note_handler))
        .route("/notes/{id}", put(update_note_handler).delete(delete_note_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
