//! Liveness and storage health

pub mod handlers;

pub use handlers::*;
