//! crates/notekeeper_core/src/memory.rs
//!
//! A process-local implementation of the persistence ports. Used when no
//! database is configured and throughout the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{NewNote, NewUser, Note, User};
use crate::filter::NoteFilter;
use crate::ports::{NoteStore, PortError, PortResult, SessionStore, UserStore};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    // BTreeMap keeps notes in id (creation) order.
    notes: BTreeMap<i64, Note>,
    next_note_id: i64,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
}

/// All three stores behind a single lock, so every operation is atomic.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> PortResult<User> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(PortError::Conflict(format!("email {} already registered", user.email)));
        }
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            confirmed: false,
            confirmation_token: Some(user.confirmation_token),
            created_at: Utc::now(),
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> PortResult<Option<User>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn find_user_by_token(&self, token: &str) -> PortResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.confirmation_token.as_deref() == Some(token))
            .cloned())
    }

    async fn confirm_user_by_token(&self, token: &str) -> PortResult<Option<User>> {
        let mut tables = self.lock()?;
        let Some(user) = tables
            .users
            .values_mut()
            .find(|u| u.confirmation_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };
        user.confirmed = true;
        user.confirmation_token = None;
        Ok(Some(user.clone()))
    }
}

//=========================================================================================
// `NoteStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl NoteStore for InMemoryStore {
    async fn insert_note(&self, note: NewNote) -> PortResult<Note> {
        let mut tables = self.lock()?;
        tables.next_note_id += 1;
        let record = Note {
            id: tables.next_note_id,
            owner_id: note.owner_id,
            title: note.title,
            content: note.content,
            category: note.category,
            status: note.status,
            created_at: Utc::now(),
        };
        tables.notes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_note(&self, note_id: i64) -> PortResult<Option<Note>> {
        Ok(self.lock()?.notes.get(&note_id).cloned())
    }

    async fn update_note(&self, note: &Note) -> PortResult<Option<Note>> {
        let mut tables = self.lock()?;
        match tables.notes.get_mut(&note.id) {
            Some(stored) if stored.owner_id == note.owner_id => {
                stored.title = note.title.clone();
                stored.content = note.content.clone();
                stored.category = note.category.clone();
                stored.status = note.status;
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_note(&self, owner_id: Uuid, note_id: i64) -> PortResult<bool> {
        let mut tables = self.lock()?;
        let owned = tables
            .notes
            .get(&note_id)
            .is_some_and(|n| n.owner_id == owner_id);
        if owned {
            tables.notes.remove(&note_id);
        }
        Ok(owned)
    }

    async fn search_notes(&self, owner_id: Uuid, filter: &NoteFilter) -> PortResult<Vec<Note>> {
        let tables = self.lock()?;
        Ok(tables
            .notes
            .values()
            .rev()
            .filter(|n| n.owner_id == owner_id && filter.matches(n))
            .cloned()
            .collect())
    }
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.lock()?
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Option<Uuid>> {
        let mut tables = self.lock()?;
        let Some(&(user_id, expires_at)) = tables.sessions.get(session_id) else {
            return Ok(None);
        };
        if expires_at > Utc::now() {
            return Ok(Some(user_id));
        }
        tables.sessions.remove(session_id);
        Ok(None)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.lock()?.sessions.remove(session_id);
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> PortResult<u64> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}
