//! services/api/src/adapters/mailer.rs
//!
//! A `ConfirmationMailer` that "sends" mail by writing one text file per
//! message into a directory. No real delivery happens.

use async_trait::async_trait;
use chrono::Utc;
use notekeeper_core::ports::{ConfirmationMailer, PortError, PortResult};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct FileMailer {
    outbox: PathBuf,
}

impl FileMailer {
    pub fn new(outbox: impl Into<PathBuf>) -> Self {
        Self {
            outbox: outbox.into(),
        }
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }
}

fn render_confirmation(email: &str, link: &str) -> String {
    format!(
        "To: {}\nSubject: Confirm your account\n\nPlease confirm your account by visiting: {}\n",
        email, link
    )
}

#[async_trait]
impl ConfirmationMailer for FileMailer {
    async fn send_confirmation(&self, email: &str, link: &str) -> PortResult<()> {
        tokio::fs::create_dir_all(&self.outbox)
            .await
            .map_err(|e| PortError::Unexpected(format!("create outbox: {}", e)))?;

        let file_name = format!(
            "confirmation_{}_{}.txt",
            Utc::now().timestamp(),
            Uuid::new_v4().simple()
        );
        let path = self.outbox.join(file_name);
        tokio::fs::write(&path, render_confirmation(email, link))
            .await
            .map_err(|e| PortError::Unexpected(format!("write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Wrote confirmation email");
        Ok(())
    }
}
