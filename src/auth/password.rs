//! Password hashing and verification using Argon2id
//!
//! Hashes are stored as PHC strings, so verification reads the parameters
//! back out of the hash and keeps working after the cost settings change.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid password hashing parameters: {0}")]
    Params(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Password hashing task failed: {0}")]
    Join(String),
}

/// Argon2id cost settings used for new hashes
#[derive(Debug, Clone, Copy)]
pub struct PasswordHashing {
    memory_kib: u32,
    iterations: u32,
}

impl PasswordHashing {
    pub fn new(memory_kib: u32, iterations: u32) -> Self {
        Self { memory_kib, iterations }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.password_memory_kib, config.password_iterations)
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(self.memory_kib, self.iterations, 1, None).map_err(|e| PasswordError::Params(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password; the result is a PHC string with salt and parameters.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

        self.argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// True when `password` matches `hash`. A hash that does not parse never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is not a valid PHC string: {}", e);
                return false;
            }
        };
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }

    /// `hash` on the blocking pool
    pub async fn hash_blocking(&self, password: String) -> Result<String, PasswordError> {
        let hashing = *self;
        tokio::task::spawn_blocking(move || hashing.hash(&password))
            .await
            .map_err(|e| PasswordError::Join(e.to_string()))?
    }

    /// `verify` on the blocking pool
    pub async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, PasswordError> {
        let hashing = *self;
        tokio::task::spawn_blocking(move || hashing.verify(&password, &hash))
            .await
            .map_err(|e| PasswordError::Join(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHashing {
        PasswordHashing::new(64, 1)
    }

    #[test]
    fn hash_and_verify() {
        let hash = cheap().hash("correct-horse-battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(cheap().verify("correct-horse-battery", &hash));
        assert!(!cheap().verify("wrong-password", &hash));
    }

    #[test]
    fn salts_differ_per_hash() {
        let a = cheap().hash("same-password").unwrap();
        let b = cheap().hash("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unparseable_hash_never_matches() {
        assert!(!cheap().verify("password", "not-a-valid-hash"));
    }

    #[test]
    fn verification_uses_parameters_from_hash() {
        let hash = PasswordHashing::new(128, 2).hash("rotate-me").unwrap();
        assert!(cheap().verify("rotate-me", &hash));
    }

    #[test]
    fn rejects_impossible_parameters() {
        assert!(matches!(PasswordHashing::new(1, 0).hash("x"), Err(PasswordError::Params(_))));
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() {
        let hash = cheap().hash_blocking("on-the-pool".to_string()).await.unwrap();
        assert!(cheap().verify_blocking("on-the-pool".to_string(), hash).await.unwrap());
    }
}
