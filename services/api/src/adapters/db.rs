//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the persistence ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notekeeper_core::domain::{NewNote, NewUser, Note, NoteStatus, User};
use notekeeper_core::filter::NoteFilter;
use notekeeper_core::ports::{NoteStore, PortError, PortResult, SessionStore, UserStore};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `UserStore`, `NoteStore` and `SessionStore` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, confirmed, confirmation_token, created_at";
const NOTE_COLUMNS: &str = "id, owner_id, title, content, category, status, created_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    password_hash: String,
    confirmed: bool,
    confirmation_token: Option<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            confirmed: self.confirmed,
            confirmation_token: self.confirmation_token,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: i64,
    owner_id: Uuid,
    title: String,
    content: String,
    category: String,
    status: String,
    created_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> PortResult<Note> {
        let status = self.status.parse::<NoteStatus>().map_err(|_| {
            PortError::Unexpected(format!("note {} has unknown status '{}'", self.id, self.status))
        })?;
        Ok(Note {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            content: self.content,
            category: self.category,
            status,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn insert_user(&self, user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, email, password_hash, confirmation_token) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.confirmation_token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("email {} already registered", user.email))
            }
            other => unexpected(other),
        })?;
        Ok(record.to_domain())
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn find_user_by_token(&self, token: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE confirmation_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn confirm_user_by_token(&self, token: &str) -> PortResult<Option<User>> {
        // The WHERE clause is the guard: of two racing confirmations only one
        // still sees the token.
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET confirmed = TRUE, confirmation_token = NULL \
             WHERE confirmation_token = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }
}

//=========================================================================================
// `NoteStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl NoteStore for DbAdapter {
    async fn insert_note(&self, note: NewNote) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "INSERT INTO notes (owner_id, title, content, category, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {NOTE_COLUMNS}"
        ))
        .bind(note.owner_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.category)
        .bind(note.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn find_note(&self, note_id: i64) -> PortResult<Option<Note>> {
        sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1"
        ))
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(NoteRecord::to_domain)
        .transpose()
    }

    async fn update_note(&self, note: &Note) -> PortResult<Option<Note>> {
        sqlx::query_as::<_, NoteRecord>(&format!(
            "UPDATE notes SET title = $3, content = $4, category = $5, status = $6 \
             WHERE id = $1 AND owner_id = $2 RETURNING {NOTE_COLUMNS}"
        ))
        .bind(note.id)
        .bind(note.owner_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.category)
        .bind(note.status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(NoteRecord::to_domain)
        .transpose()
    }

    async fn delete_note(&self, owner_id: Uuid, note_id: i64) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner_id = $2")
            .bind(note_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_notes(&self, owner_id: Uuid, filter: &NoteFilter) -> PortResult<Vec<Note>> {
        let mut query = search_query(owner_id, filter);
        let records = query
            .build_query_as::<NoteRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(NoteRecord::to_domain).collect()
    }
}

/// Renders `filter` as SQL. `strpos` keeps the substring match literal, so
/// `%` and `_` in a search term carry no pattern meaning.
fn search_query(owner_id: Uuid, filter: &NoteFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = "));
    query.push_bind(owner_id);

    if let Some(q) = filter.query() {
        query
            .push(" AND (strpos(lower(title), ")
            .push_bind(q.to_string())
            .push(") > 0 OR strpos(lower(content), ")
            .push_bind(q.to_string())
            .push(") > 0)");
    }
    if let Some(status) = filter.status() {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category) = filter.category() {
        query.push(" AND category = ").push_bind(category.to_string());
    }
    query.push(" ORDER BY id DESC");
    query
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for DbAdapter {
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }
}
