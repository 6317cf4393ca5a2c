//! Identity module: authentication & user management
//!
//! - [`CredentialVerifier`]: email + password against the stored bcrypt hash
//! - [`TokenAuthority`]: issues and checks signed bearer tokens
//! - [`UserService`]: CRUD and login orchestration used by the HTTP layer

pub mod authority;
pub mod errors;
pub mod service;
pub mod verifier;

pub use authority::{IssuedToken, TokenAuthority};
pub use errors::{AuthFailure, AuthzFailure, LoginError};
pub use service::{AuthResult, NewUser, UserChanges, UserService};
pub use verifier::CredentialVerifier;
