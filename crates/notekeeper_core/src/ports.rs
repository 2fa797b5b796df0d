//! crates/notekeeper_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or mailers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{NewNote, NewUser, Note, User};
use crate::filter::NoteFilter;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Conflicting record: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new, unconfirmed user.
    /// Fails with `PortError::Conflict` when the email is already taken.
    async fn insert_user(&self, user: NewUser) -> PortResult<User>;

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>>;

    async fn find_user_by_id(&self, user_id: Uuid) -> PortResult<Option<User>>;

    async fn find_user_by_token(&self, token: &str) -> PortResult<Option<User>>;

    /// Marks the user holding `token` as confirmed and clears the token, in one
    /// conditional write. Returns `None` when no user holds the token any more.
    async fn confirm_user_by_token(&self, token: &str) -> PortResult<Option<User>>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert_note(&self, note: NewNote) -> PortResult<Note>;

    async fn find_note(&self, note_id: i64) -> PortResult<Option<Note>>;

    /// Writes every mutable field of `note`, matching on both id and owner.
    /// Returns `None` if no such row exists.
    async fn update_note(&self, note: &Note) -> PortResult<Option<Note>>;

    /// Returns whether a row owned by `owner_id` was removed.
    async fn delete_note(&self, owner_id: Uuid, note_id: i64) -> PortResult<bool>;

    /// All notes of `owner_id` matching `filter`, newest (highest id) first.
    async fn search_notes(&self, owner_id: Uuid, filter: &NoteFilter) -> PortResult<Vec<Note>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the bound user id, or `None` for unknown and expired sessions.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Option<Uuid>>;

    /// Deleting an unknown session succeeds.
    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    /// Removes every session past its expiry and returns how many were removed.
    async fn purge_expired_sessions(&self) -> PortResult<u64>;
}

//=========================================================================================
// Collaborator Ports
//=========================================================================================

/// A slow, salted password hash.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> PortResult<String>;

    fn verify(&self, password: &str, hash: &str) -> PortResult<bool>;
}

#[async_trait]
pub trait ConfirmationMailer: Send + Sync {
    /// Durably records a message to `email` containing `link`.
    async fn send_confirmation(&self, email: &str, link: &str) -> PortResult<()>;
}
