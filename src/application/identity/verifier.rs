//! Credential verification
//!
//! One exact-match lookup by email, then a bcrypt comparison. When the email
//! is unknown a comparison against a throwaway hash still runs, so both
//! failure paths cost one bcrypt verification.

use std::sync::Arc;

use tracing::{debug, warn};

use super::errors::AuthFailure;
use crate::domain::{UserProfile, UserRepositoryInterface};
use crate::infrastructure::crypto::password::{
    hash_password_blocking, verify_password_blocking, PasswordError,
};

pub struct CredentialVerifier {
    repo: Arc<dyn UserRepositoryInterface>,
    dummy_hash: String,
}

impl CredentialVerifier {
    /// `cost` should match the cost used for stored hashes so the
    /// not-found path takes as long as a real comparison.
    pub async fn new(
        repo: Arc<dyn UserRepositoryInterface>,
        cost: u32,
    ) -> Result<Self, PasswordError> {
        let dummy_hash = hash_password_blocking(uuid::Uuid::new_v4().to_string(), cost).await?;
        Ok(Self { repo, dummy_hash })
    }

    pub async fn verify(&self, email: &str, password: &str) -> Result<UserProfile, AuthFailure> {
        let user = self.repo.get_user_by_email(email).await.map_err(|e| {
            warn!(error = %e, "Credential lookup failed");
            AuthFailure::BackendUnavailable(e.to_string())
        })?;

        let Some(user) = user else {
            // Result is ignored; the comparison only keeps timing uniform.
            let _ = verify_password_blocking(password.to_string(), self.dummy_hash.clone()).await;
            debug!(email, "Login rejected: unknown email");
            return Err(AuthFailure::NotFound);
        };

        match verify_password_blocking(password.to_string(), user.password_hash.clone()).await {
            Ok(true) => Ok(user.into_profile()),
            Ok(false) => {
                debug!(email, "Login rejected: password mismatch");
                Err(AuthFailure::MismatchedSecret)
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored credential could not be checked");
                Err(AuthFailure::BackendUnavailable(e.to_string()))
            }
        }
    }
}
