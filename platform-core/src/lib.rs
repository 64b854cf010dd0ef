//! Shared plumbing for platform services: the common error taxonomy,
//! environment configuration, structured logging, and HTTP middleware.

pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

// Re-export the crates services build on so every member resolves the
// same versions through this crate.
pub use async_trait;
pub use axum;
pub use mongodb;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;
