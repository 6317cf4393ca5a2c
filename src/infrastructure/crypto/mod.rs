//! Cryptographic primitives: bcrypt password hashing and JWT signing.

pub mod jwt;
pub mod password;

pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims, TOKEN_TTL_SECS};
pub use password::{hash_password, verify_password, PasswordError};
