use platform_core::error::AppError;
use thiserror::Error;

/// Domain errors raised below the handler layer.
///
/// The deliberately vague variants (`InvalidCredentials`,
/// `InvalidRefreshToken`) cover several distinct causes on purpose: their
/// HTTP mapping must not let a caller probe which usernames exist or which
/// step of a refresh failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Store(#[from] AppError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Username already registered")]
    AlreadyRegistered,

    #[error("Password and confirm password do not match")]
    PasswordMismatch,

    #[error("New password must differ from the previous password")]
    PasswordReuse,

    #[error("No reset secret on record")]
    SecretNotSet,

    #[error("Invalid secret")]
    InvalidSecret,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => e,
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid username or password"))
            }
            ServiceError::InvalidRefreshToken => {
                AppError::AuthError(anyhow::anyhow!("Invalid refresh token"))
            }
            ServiceError::IdentityNotFound => {
                AppError::NotFound(anyhow::anyhow!("User not found"))
            }
            ServiceError::AlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Username is already registered"))
            }
            ServiceError::PasswordMismatch => AppError::BadRequest(anyhow::anyhow!(
                "Password and confirm password do not match"
            )),
            ServiceError::PasswordReuse => AppError::BadRequest(anyhow::anyhow!(
                "New password cannot be the same as previous password"
            )),
            ServiceError::SecretNotSet => AppError::BadRequest(anyhow::anyhow!(
                "No reset secret set. Please register first."
            )),
            ServiceError::InvalidSecret => {
                AppError::AuthError(anyhow::anyhow!("Invalid secret"))
            }
        }
    }
}
