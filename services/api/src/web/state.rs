//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use chrono::Duration;
use notekeeper_core::ports::{
    ConfirmationMailer, NoteStore, PasswordHasher, SessionStore, UserStore,
};
use notekeeper_core::services::{AccountService, NoteService, SessionManager};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: AccountService,
    pub sessions: SessionManager,
    pub notes: NoteService,
}

/// The adapters the services are wired to.
pub struct Adapters {
    pub users: Arc<dyn UserStore>,
    pub notes: Arc<dyn NoteStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub mailer: Arc<dyn ConfirmationMailer>,
}

impl AppState {
    pub fn new(config: Arc<Config>, adapters: Adapters) -> Self {
        let accounts = AccountService::new(
            adapters.users.clone(),
            adapters.hasher,
            adapters.mailer,
            config.public_base_url.clone(),
        );
        let sessions = SessionManager::new(
            adapters.sessions,
            adapters.users,
            Duration::hours(config.session_ttl_hours),
        );
        let notes = NoteService::new(adapters.notes);
        Self {
            config,
            accounts,
            sessions,
            notes,
        }
    }
}
