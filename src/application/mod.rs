//! Application layer: authentication and user-management use-cases

pub mod identity;

pub use identity::{
    AuthFailure, AuthResult, AuthzFailure, CredentialVerifier, IssuedToken, LoginError,
    NewUser, TokenAuthority, UserChanges, UserService,
};
