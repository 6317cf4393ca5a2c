//! Password hashing utilities
//!
//! bcrypt is CPU-bound; the `*_blocking` variants move the work onto Tokio's
//! blocking pool so request tasks keep running.
//!
//! bcrypt only reads the first [`MAX_PASSWORD_BYTES`] bytes of its input.
//! Longer passwords are refused when hashing and never verify, so two
//! passwords sharing a 72-byte prefix cannot stand in for each other.

use bcrypt::{hash, verify};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Task(String),

    #[error("password is {0} bytes, the limit is 72")]
    TooLong(usize),
}

/// Longest password, in UTF-8 bytes, that bcrypt hashes without truncation
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt with the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong(password.len()));
    }
    Ok(hash(password, cost)?)
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    // Still parse the hash so a corrupt one is reported either way.
    let matched = verify(password, hash)?;
    Ok(matched && password.len() <= MAX_PASSWORD_BYTES)
}

/// [`hash_password`] on the blocking thread pool
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
}

/// [`verify_password`] on the blocking thread pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
}
