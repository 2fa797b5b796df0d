//! crates/notekeeper_core/src/testing.rs
//!
//! Collaborator doubles shared by the core and service test suites.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::ports::{ConfirmationMailer, PasswordHasher, PortError, PortResult};

/// Reversible "hash" that keeps tests fast. Never use outside tests.
#[derive(Default)]
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, password: &str) -> PortResult<String> {
        Ok(format!("plain${}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> PortResult<bool> {
        Ok(hash.strip_prefix("plain$") == Some(password))
    }
}

/// Keeps every (email, link) pair it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// The token at the end of the most recent link.
    pub fn last_token(&self) -> Option<String> {
        self.sent()
            .last()
            .and_then(|(_, link)| link.rsplit('/').next().map(str::to_string))
    }
}

#[async_trait]
impl ConfirmationMailer for RecordingMailer {
    async fn send_confirmation(&self, email: &str, link: &str) -> PortResult<()> {
        if self.fail {
            return Err(PortError::Unexpected("mail outbox unavailable".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| PortError::Unexpected("mailer lock poisoned".to_string()))?
            .push((email.to_string(), link.to_string()));
        Ok(())
    }
}
