//! crates/notekeeper_core/src/error.rs
//!
//! The error type returned by the core services.

use crate::ports::PortError;

/// Every per-request outcome a service can reject with.
///
/// The domain kinds are shown to the caller verbatim. `Internal` wraps a
/// storage or collaborator failure and must not be confused with them.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("User already exists")]
    DuplicateAccount,

    #[error("Invalid or expired confirmation token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not confirmed")]
    AccountNotConfirmed,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Note not found")]
    NotFound,

    #[error("Internal failure: {0}")]
    Internal(#[from] PortError),
}

/// A convenience type alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = Result<T, ServiceError>;
