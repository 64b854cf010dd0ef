//! Domain logic: session orchestration, token signing, storage adapters,
//! and the permission catalog.

pub mod catalog;
pub mod database;
pub mod error;
pub mod session;
pub mod token;

pub use catalog::{HandlerGroup, PermissionRegistry, RegisteredHandler, tags};
pub use database::{IdentityStore, MemoryStore, MongoStore};
pub use error::ServiceError;
pub use session::{SessionService, hash_refresh_token};
pub use token::{Claims, TokenCodec, TokenError, TokenPair};
