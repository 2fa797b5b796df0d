//! crates/notekeeper_core/src/services/account.rs
//!
//! Registration, email confirmation and credential checks.
//!
//! An account moves `Unregistered -> PendingConfirmation -> Confirmed` and
//! never back. The confirmation token exists only in the pending state.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{normalize_email, NewUser, User};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{ConfirmationMailer, PasswordHasher, PortError, UserStore};
use crate::token::generate_token;

/// The outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    /// The link that was handed to the mailer. Only surfaced to API callers
    /// when explicitly enabled.
    pub confirmation_link: String,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn ConfirmationMailer>,
    public_base_url: String,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn ConfirmationMailer>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            hasher,
            mailer,
            public_base_url: public_base_url.into(),
        }
    }

    /// Builds the link embedding a raw confirmation token.
    pub fn confirmation_link(&self, token: &str) -> String {
        format!("{}/confirm/{}", self.public_base_url.trim_end_matches('/'), token)
    }

    pub async fn register(&self, email: &str, password: &str) -> ServiceResult<Registration> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::DuplicateAccount);
        }

        let password_hash = self.hasher.hash(password)?;
        let token = generate_token();
        let confirmation_link = self.confirmation_link(&token);

        // The row is written only once the link has been delivered.
        if let Err(e) = self.mailer.send_confirmation(&email, &confirmation_link).await {
            error!(email = %email, "Failed to deliver confirmation email: {:?}", e);
            return Err(e.into());
        }

        let user = self
            .users
            .insert_user(NewUser {
                email: email.clone(),
                password_hash,
                confirmation_token: token,
            })
            .await
            .map_err(|e| match e {
                // Lost a race against a concurrent registration.
                PortError::Conflict(_) => ServiceError::DuplicateAccount,
                other => ServiceError::Internal(other),
            })?;

        info!(user_id = %user.id, "Registered user, awaiting confirmation");
        Ok(Registration {
            user,
            confirmation_link,
        })
    }

    /// Consumes a confirmation token. Unknown, mistyped and already used
    /// tokens are all rejected the same way.
    pub async fn confirm(&self, token: &str) -> ServiceResult<User> {
        if token.is_empty() {
            return Err(ServiceError::InvalidToken);
        }
        match self.users.confirm_user_by_token(token).await? {
            Some(user) => {
                info!(user_id = %user.id, "Confirmed account");
                Ok(user)
            }
            None => {
                warn!("Rejected confirmation attempt with unknown token");
                Err(ServiceError::InvalidToken)
            }
        }
    }

    /// Checks credentials. An unknown email and a wrong password produce the
    /// same error; only a correct password reveals that the account is unconfirmed.
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        let Some(user) = self.users.find_user_by_email(&email).await? else {
            return Err(ServiceError::InvalidCredentials);
        };
        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }
        if !user.confirmed {
            return Err(ServiceError::AccountNotConfirmed);
        }
        Ok(user)
    }
}
