//! Authentication module: login, registration, protected probe

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
