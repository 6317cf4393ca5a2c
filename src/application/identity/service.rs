//! User management service: application-layer orchestration
//!
//! All user-related business logic lives here.
//! HTTP handlers should be thin wrappers that delegate to this service.
//! Nothing returned from this service carries a password hash.

use std::sync::Arc;

use tracing::info;

use super::authority::{IssuedToken, TokenAuthority};
use super::errors::LoginError;
use super::verifier::CredentialVerifier;
use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, UpdateUserDto, UserProfile,
    UserRepositoryInterface,
};
use crate::infrastructure::crypto::password::{
    hash_password_blocking, PasswordError, MAX_PASSWORD_BYTES,
};

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: IssuedToken,
    pub user: UserProfile,
}

/// Input for creating a user; `password` is plaintext and hashed here.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub telephone: String,
    pub password: String,
}

/// Partial update; a new `password` is re-hashed before storage.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub password: Option<String>,
}

/// User service: orchestrates all identity / user-management use-cases.
pub struct UserService {
    repo: Arc<dyn UserRepositoryInterface>,
    verifier: CredentialVerifier,
    authority: Arc<TokenAuthority>,
    bcrypt_cost: u32,
}

impl UserService {
    pub async fn new(
        repo: Arc<dyn UserRepositoryInterface>,
        authority: Arc<TokenAuthority>,
        bcrypt_cost: u32,
    ) -> Result<Self, PasswordError> {
        let verifier = CredentialVerifier::new(repo.clone(), bcrypt_cost).await?;
        Ok(Self {
            repo,
            verifier,
            authority,
            bcrypt_cost,
        })
    }

    pub fn authority(&self) -> &Arc<TokenAuthority> {
        &self.authority
    }

    // ── Authentication ──────────────────────────────────────────

    /// Verify email + password and issue a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, LoginError> {
        let user = self.verifier.verify(email, password).await?;
        let token = self.authority.issue(&user)?;

        info!(user_id = %user.id, "User logged in");
        Ok(AuthResult { token, user })
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn list_users(&self, filter: GetUserDto) -> DomainResult<Vec<UserProfile>> {
        let users = self.repo.list_users(filter).await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<UserProfile>> {
        Ok(self.repo.get_user_by_id(id).await?.map(UserProfile::from))
    }

    // ── Commands (mutations) ────────────────────────────────────

    /// Create a user, hashing the password with the configured cost.
    pub async fn create_user(&self, new_user: NewUser) -> DomainResult<UserProfile> {
        check_password(&new_user.password)?;

        let password_hash = self.hash(new_user.password).await?;

        let user = self
            .repo
            .create_user(CreateUserDto {
                name: new_user.name,
                email: new_user.email,
                telephone: new_user.telephone,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "User created");
        Ok(user.into_profile())
    }

    pub async fn update_user(
        &self,
        id: &str,
        changes: UserChanges,
    ) -> DomainResult<Option<UserProfile>> {
        let password_hash = match changes.password {
            Some(password) => {
                check_password(&password)?;
                Some(self.hash(password).await?)
            }
            None => None,
        };

        let dto = UpdateUserDto {
            name: changes.name,
            email: changes.email,
            telephone: changes.telephone,
            password_hash,
        };
        let password_changed = dto.password_hash.is_some();

        let updated = self.repo.update_user(id, dto).await?;

        if updated.is_some() {
            info!(user_id = id, password_changed, "User updated");
        }
        Ok(updated.map(UserProfile::from))
    }

    pub async fn delete_user(&self, id: &str) -> DomainResult<()> {
        self.repo.delete_user(id).await?;
        info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn hash(&self, password: String) -> DomainResult<String> {
        hash_password_blocking(password, self.bcrypt_cost)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))
    }
}

/// bcrypt would silently drop everything past the byte limit.
fn check_password(password: &str) -> DomainResult<()> {
    if password.is_empty() {
        return Err(DomainError::Validation("Password is required".into()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(DomainError::Validation(format!(
            "Password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::identity::{AuthFailure, AuthzFailure};
    use crate::infrastructure::crypto::jwt::JwtConfig;
    use crate::infrastructure::storage::InMemoryUserRepository;

    const TEST_COST: u32 = 4;

    async fn service() -> (UserService, Arc<InMemoryUserRepository>) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let authority = Arc::new(TokenAuthority::new(JwtConfig::new("test-secret")).unwrap());
        let service = UserService::new(repo.clone(), authority, TEST_COST)
            .await
            .unwrap();
        (service, repo)
    }

    fn ann() -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: "a@x.com".into(),
            telephone: "+100".into(),
            password: "secret123".into(),
        }
    }

    #[tokio::test]
    async fn create_stores_a_bcrypt_hash() {
        let (service, repo) = service().await;
        let created = service.create_user(ann()).await.unwrap();

        let stored = repo.get_user_by_id(&created.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret123");
        assert!(stored.password_hash.starts_with("$2b$04$"));
    }

    #[tokio::test]
    async fn full_login_scenario() {
        let (service, _) = service().await;
        service.create_user(ann()).await.unwrap();

        let result = service.login("a@x.com", "secret123").await.unwrap();
        assert_eq!(result.user.email, "a@x.com");

        let err = service.login("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            LoginError::Credentials(AuthFailure::MismatchedSecret)
        ));

        let authority = service.authority();
        let header = format!("Bearer {}", result.token.token);
        let claims = authority.authorize(Some(&header)).unwrap();
        assert_eq!(claims.email, "a@x.com");

        assert_eq!(
            authority.authorize(None).unwrap_err(),
            AuthzFailure::MissingToken
        );

        let mut tampered = result.token.token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'x' { 'y' } else { 'x' });
        assert_eq!(
            authority
                .authorize(Some(&format!("Bearer {}", tampered)))
                .unwrap_err(),
            AuthzFailure::InvalidToken
        );
    }

    #[tokio::test]
    async fn updated_password_is_rehashed_and_usable() {
        let (service, repo) = service().await;
        let created = service.create_user(ann()).await.unwrap();

        service
            .update_user(
                &created.id,
                UserChanges {
                    password: Some("n3w-password".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        let stored = repo.get_user_by_id(&created.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "n3w-password");

        assert!(service.login("a@x.com", "n3w-password").await.is_ok());
        assert!(service.login("a@x.com", "secret123").await.is_err());
    }

    #[tokio::test]
    async fn empty_password_is_rejected() {
        let (service, _) = service().await;
        let err = service
            .create_user(NewUser {
                password: String::new(),
                ..ann()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn password_over_72_bytes_is_rejected_before_hashing() {
        let (service, repo) = service().await;
        let err = service
            .create_user(NewUser {
                password: "é".repeat(40),
                ..ann()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(repo.is_empty());

        let created = service.create_user(ann()).await.unwrap();
        let err = service
            .update_user(
                &created.id,
                UserChanges {
                    password: Some("x".repeat(73)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(service.login("a@x.com", "secret123").await.is_ok());
    }

    #[tokio::test]
    async fn password_sharing_a_72_byte_prefix_cannot_log_in() {
        let (service, _) = service().await;
        service
            .create_user(NewUser {
                password: "é".repeat(36),
                ..ann()
            })
            .await
            .unwrap();

        let longer = format!("{}zzzz", "é".repeat(36));
        let err = service.login("a@x.com", &longer).await.unwrap_err();
        assert!(matches!(
            err,
            LoginError::Credentials(AuthFailure::MismatchedSecret)
        ));
        assert!(service.login("a@x.com", &"é".repeat(36)).await.is_ok());
    }

    #[tokio::test]
    async fn update_of_missing_user_is_none() {
        let (service, _) = service().await;
        let updated = service
            .update_user(
                "missing",
                UserChanges {
                    name: Some("x".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}
