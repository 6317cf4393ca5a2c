//! HTTP REST API interfaces
//!
//! - `common`: error bodies and the validated JSON extractor
//! - `middleware`: bearer token authentication
//! - `modules`: handlers grouped by resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, RouterDeps};
