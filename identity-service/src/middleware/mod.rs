pub mod auth;
pub mod permission;

pub use auth::{ACCESS_TOKEN_COOKIE, AuthUser, REFRESH_TOKEN_COOKIE, auth_middleware};
pub use permission::{RequiredPermission, permission_middleware};
