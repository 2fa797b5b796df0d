//! crates/notekeeper_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ServiceError;

//=========================================================================================
// Users
//=========================================================================================

/// A registered account. `email` is always stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub confirmed: bool,
    /// Present while the account awaits confirmation, cleared afterwards.
    pub confirmation_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The row handed to a `UserStore` on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub confirmation_token: String,
}

/// Lowercases and trims an email address so lookups and uniqueness are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Notes
//=========================================================================================

/// The closed set of workflow states a note can be in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NoteStatus {
    #[default]
    New,
    Todo,
    Done,
}

impl NoteStatus {
    pub const ALL: [NoteStatus; 3] = [NoteStatus::New, NoteStatus::Todo, NoteStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::New => "new",
            NoteStatus::Todo => "todo",
            NoteStatus::Done => "done",
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ServiceError::InvalidInput(format!("Invalid status '{}'", s)))
    }
}

/// A note owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: NoteStatus,
    pub created_at: DateTime<Utc>,
}

/// The row handed to a `NoteStore` on creation.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: NoteStatus,
}

/// A partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    /// Raw status value, validated against [`NoteStatus`] when applied.
    pub status: Option<String>,
}

impl NotePatch {
    /// Applies the supplied fields to `note`.
    ///
    /// The patch is validated in full before anything is written, so a bad
    /// field leaves the note unchanged.
    pub fn apply_to(&self, note: &mut Note) -> Result<(), ServiceError> {
        for (name, value) in [
            ("title", &self.title),
            ("content", &self.content),
            ("category", &self.category),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ServiceError::InvalidInput(format!("{} must not be empty", name)));
            }
        }
        let status = self.status.as_deref().map(str::parse::<NoteStatus>).transpose()?;

        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(category) = &self.category {
            note.category = category.clone();
        }
        if let Some(status) = status {
            note.status = status;
        }
        Ok(())
    }
}
