//! Domain layer
//!
//! The user aggregate and the persistence contract it depends on.

pub mod user;

pub use user::{
    CreateUserDto, FilterMode, GetUserDto, UpdateUserDto, User, UserProfile,
    UserRepositoryInterface,
};

pub use crate::shared::errors::{DomainError, DomainResult};
