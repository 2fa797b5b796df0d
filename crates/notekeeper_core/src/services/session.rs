//! crates/notekeeper_core/src/services/session.rs
//!
//! Turns a successful credential check into a login session and resolves
//! session ids back to users.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{AuthSession, User};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{SessionStore, UserStore};
use crate::token::generate_token;

#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(sessions: Arc<dyn SessionStore>, users: Arc<dyn UserStore>, ttl: Duration) -> Self {
        Self {
            sessions,
            users,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Opens a new session for `user`. Any session the caller was already
    /// holding is revoked first, so logins replace rather than accumulate.
    /// Expired sessions of every user are swept at the same time.
    pub async fn establish(
        &self,
        user: &User,
        current_session: Option<&str>,
    ) -> ServiceResult<AuthSession> {
        if let Some(previous) = current_session {
            self.sessions.delete_auth_session(previous).await?;
        }
        let purged = self.sessions.purge_expired_sessions().await?;
        if purged > 0 {
            debug!(purged, "Removed expired sessions");
        }

        let session = AuthSession {
            id: generate_token(),
            user_id: user.id,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions
            .create_auth_session(&session.id, session.user_id, session.expires_at)
            .await?;

        info!(user_id = %user.id, expires_at = %session.expires_at, "Established session");
        Ok(session)
    }

    /// Resolves a session id to the current state of its user.
    ///
    /// The user is always reloaded from the store; nothing about the user is
    /// cached in the session itself.
    pub async fn resolve(&self, session_id: Option<&str>) -> ServiceResult<User> {
        let session_id = session_id
            .filter(|id| !id.is_empty())
            .ok_or(ServiceError::Unauthenticated)?;
        let user_id = self
            .sessions
            .validate_auth_session(session_id)
            .await?
            .ok_or(ServiceError::Unauthenticated)?;
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::Unauthenticated)
    }

    /// Ends the session if there is one. Calling this without a session, or
    /// twice, is not an error.
    pub async fn terminate(&self, session_id: Option<&str>) -> ServiceResult<()> {
        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            self.sessions.delete_auth_session(id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;
    use crate::memory::InMemoryStore;

    async fn setup(ttl: Duration) -> (SessionManager, Arc<InMemoryStore>, User) {
        let store = Arc::new(InMemoryStore::new());
        let user = store
            .insert_user(NewUser {
                email: "a@x.com".into(),
                password_hash: "h".into(),
                confirmation_token: "t".into(),
            })
            .await
            .unwrap();
        let manager = SessionManager::new(store.clone(), store.clone(), ttl);
        (manager, store, user)
    }

    #[tokio::test]
    async fn establish_then_resolve() {
        let (sessions, _, user) = setup(Duration::hours(1)).await;
        let session = sessions.establish(&user, None).await.unwrap();
        assert_eq!(session.user_id, user.id);

        let resolved = sessions.resolve(Some(&session.id)).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn resolve_reloads_user_state() {
        let (sessions, store, user) = setup(Duration::hours(1)).await;
        let session = sessions.establish(&user, None).await.unwrap();
        assert!(!sessions.resolve(Some(&session.id)).await.unwrap().confirmed);

        store.confirm_user_by_token("t").await.unwrap();
        assert!(sessions.resolve(Some(&session.id)).await.unwrap().confirmed);
    }

    #[tokio::test]
    async fn fresh_login_supersedes_previous_session() {
        let (sessions, _, user) = setup(Duration::hours(1)).await;
        let first = sessions.establish(&user, None).await.unwrap();
        let second = sessions.establish(&user, Some(&first.id)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(matches!(
            sessions.resolve(Some(&first.id)).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(sessions.resolve(Some(&second.id)).await.is_ok());
    }

    #[tokio::test]
    async fn missing_unknown_and_expired_sessions_are_unauthenticated() {
        let (sessions, _, user) = setup(Duration::seconds(-1)).await;
        let expired = sessions.establish(&user, None).await.unwrap();

        for id in [None, Some(""), Some("unknown"), Some(expired.id.as_str())] {
            assert!(matches!(
                sessions.resolve(id).await,
                Err(ServiceError::Unauthenticated)
            ));
        }
    }

    #[tokio::test]
    async fn establish_sweeps_expired_sessions() {
        let (sessions, store, user) = setup(Duration::hours(1)).await;
        store
            .create_auth_session("stale", user.id, Utc::now() - Duration::minutes(5))
            .await
            .unwrap();

        let live = sessions.establish(&user, None).await.unwrap();
        assert_eq!(store.purge_expired_sessions().await.unwrap(), 0);
        assert!(sessions.resolve(Some(&live.id)).await.is_ok());
    }

    #[tokio::test]
    async fn terminate_is_idempotent() {
        let (sessions, _, user) = setup(Duration::hours(1)).await;
        let session = sessions.establish(&user, None).await.unwrap();

        sessions.terminate(Some(&session.id)).await.unwrap();
        sessions.terminate(Some(&session.id)).await.unwrap();
        sessions.terminate(None).await.unwrap();
        assert!(sessions.resolve(Some(&session.id)).await.is_err());
    }
}
