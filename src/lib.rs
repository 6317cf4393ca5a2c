//! # User Service
//!
//! User management REST service: CRUD over users plus email/password
//! login that issues short-lived JWT bearer tokens.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: User entity, DTOs and the repository trait
//! - **application**: Credential verification, token authority, user service
//! - **infrastructure**: Database (SeaORM), in-memory storage, crypto
//! - **interfaces**: HTTP API with Swagger documentation
//! - **shared**: Error types and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::http::create_api_router;
