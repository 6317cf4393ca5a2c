//! Users module: user CRUD behind the bearer-token gate

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
