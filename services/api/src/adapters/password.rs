//! services/api/src/adapters/password.rs
//!
//! Argon2id implementation of the `PasswordHasher` port.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Argon2,
};
use notekeeper_core::ports::{PasswordHasher, PortError, PortResult};
use tracing::error;

#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                PortError::Unexpected("Failed to hash password".to_string())
            })
    }

    fn verify(&self, password: &str, hash: &str) -> PortResult<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            PortError::Unexpected("Stored password hash is malformed".to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() {
        let hasher = Argon2Hasher::new();
        let first = hasher.hash("secret1").unwrap();
        let second = hasher.hash("secret1").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &first).unwrap());
        assert!(!hasher.verify("secret2", &first).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(Argon2Hasher::new().verify("x", "not-a-hash").is_err());
    }
}
