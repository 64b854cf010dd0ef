pub mod auth;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by guards and extractors. Handler errors go through
/// the shared error type and produce the same shape.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid username or password")]
    pub error: String,
}
