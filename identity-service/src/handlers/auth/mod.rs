pub mod password;
pub mod registration;
pub mod session;

pub use password::{check_eligibility, reset_password};
pub use registration::register;
pub use session::{login, logout, me, refresh};
