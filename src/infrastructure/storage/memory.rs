//! In-memory user repository
//!
//! Backs the service when `database.url = "memory"` and drives the HTTP
//! tests. Email uniqueness is enforced through a separate index map so
//! concurrent inserts cannot both claim the same address.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, UpdateUserDto, User,
    UserRepositoryInterface,
};

/// In-memory storage for development and testing
pub struct InMemoryUserRepository {
    /// id -> (insertion sequence, user)
    users: DashMap<String, (u64, User)>,
    /// email -> id
    emails: DashMap<String, String>,
    sequence: AtomicU64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn conflict() -> DomainError {
        DomainError::Conflict("Email already exists".to_string())
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepositoryInterface for InMemoryUserRepository {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        match self.emails.entry(dto.email.clone()) {
            Entry::Occupied(_) => return Err(Self::conflict()),
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }

        let user = User {
            id: id.clone(),
            name: dto.name,
            email: dto.email,
            telephone: dto.telephone,
            password_hash: dto.password_hash,
            created_at: now,
            updated_at: now,
        };

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.users.insert(id, (seq, user.clone()));
        Ok(user)
    }

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<Vec<User>> {
        let dto = dto.normalized();

        let mut matched: Vec<(u64, User)> = self
            .users
            .iter()
            .filter(|entry| {
                let (_, user) = entry.value();
                dto.matches(&user.name, &user.email, &user.telephone)
            })
            .map(|entry| entry.value().clone())
            .collect();

        matched.sort_by_key(|(seq, _)| *seq);
        Ok(matched.into_iter().map(|(_, user)| user).collect())
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let Some(id) = self.emails.get(email).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        self.get_user_by_id(&id).await
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|entry| entry.value().1.clone()))
    }

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let Some(mut entry) = self.users.get_mut(id) else {
            return Ok(None);
        };

        if dto.is_empty() {
            return Ok(Some(entry.value().1.clone()));
        }

        let user = &mut entry.value_mut().1;

        if let Some(email) = dto.email {
            if email != user.email {
                match self.emails.entry(email.clone()) {
                    Entry::Occupied(_) => return Err(Self::conflict()),
                    Entry::Vacant(slot) => {
                        slot.insert(id.to_string());
                    }
                }
                self.emails.remove(&user.email);
                user.email = email;
            }
        }
        if let Some(name) = dto.name {
            user.name = name;
        }
        if let Some(telephone) = dto.telephone {
            user.telephone = telephone;
        }
        if let Some(password_hash) = dto.password_hash {
            user.password_hash = password_hash;
        }

        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: &str) -> DomainResult<()> {
        let Some((_, (_, user))) = self.users.remove(id) else {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: id.to_string(),
            });
        };

        self.emails.remove(&user.email);
        Ok(())
    }
}
