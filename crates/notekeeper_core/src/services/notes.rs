//! crates/notekeeper_core/src/services/notes.rs
//!
//! Owner-scoped note operations. A note belonging to someone else is
//! reported exactly like a note that does not exist.

use std::sync::Arc;
use tracing::info;

use crate::domain::{NewNote, Note, NotePatch, NoteStatus, User};
use crate::error::{ServiceError, ServiceResult};
use crate::filter::NoteFilter;
use crate::ports::NoteStore;

/// Fields accepted when creating a note. A missing status means `new`.
#[derive(Debug, Clone, Default)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteStore>,
}

impl NoteService {
    pub fn new(notes: Arc<dyn NoteStore>) -> Self {
        Self { notes }
    }

    pub async fn create(&self, user: &User, input: NoteInput) -> ServiceResult<Note> {
        if input.title.trim().is_empty()
            || input.content.trim().is_empty()
            || input.category.trim().is_empty()
        {
            return Err(ServiceError::InvalidInput(
                "Title, content and category are required".to_string(),
            ));
        }
        let status = match input.status.as_deref() {
            None => NoteStatus::default(),
            Some(raw) => raw.parse()?,
        };

        let note = self
            .notes
            .insert_note(NewNote {
                owner_id: user.id,
                title: input.title,
                content: input.content,
                category: input.category,
                status,
            })
            .await?;
        info!(user_id = %user.id, note_id = note.id, "Created note");
        Ok(note)
    }

    pub async fn update(&self, user: &User, note_id: i64, patch: NotePatch) -> ServiceResult<Note> {
        let mut note = self.owned_note(user, note_id).await?;
        patch.apply_to(&mut note)?;
        // A concurrent delete between lookup and write surfaces as not found.
        let updated = self
            .notes
            .update_note(&note)
            .await?
            .ok_or(ServiceError::NotFound)?;
        info!(user_id = %user.id, note_id, "Updated note");
        Ok(updated)
    }

    pub async fn delete(&self, user: &User, note_id: i64) -> ServiceResult<()> {
        if !self.notes.delete_note(user.id, note_id).await? {
            return Err(ServiceError::NotFound);
        }
        info!(user_id = %user.id, note_id, "Deleted note");
        Ok(())
    }

    /// The user's notes matching every constraint in `filter`, newest first.
    pub async fn search(&self, user: &User, filter: &NoteFilter) -> ServiceResult<Vec<Note>> {
        Ok(self.notes.search_notes(user.id, filter).await?)
    }

    async fn owned_note(&self, user: &User, note_id: i64) -> ServiceResult<Note> {
        match self.notes.find_note(note_id).await? {
            Some(note) if note.owner_id == user.id => Ok(note),
            _ => Err(ServiceError::NotFound),
        }
    }
}
