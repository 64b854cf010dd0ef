pub mod identity;
pub mod role;

pub use identity::{Identity, PublicProfile};
pub use role::Role;
