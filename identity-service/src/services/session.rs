use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::dtos::auth::{RegisterRequest, ResetPasswordRequest};
use crate::models::{Identity, PublicProfile, Role};
use crate::services::database::IdentityStore;
use crate::services::error::ServiceError;
use crate::services::token::{TokenCodec, TokenPair};
use crate::utils::{Password, PasswordHashString, hash_password, verify_password};

/// Digest a refresh token for at-rest storage. One-way, so a leaked
/// database snapshot cannot resurrect live sessions.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn digests_match(lhs: &str, rhs: &str) -> bool {
    lhs.as_bytes().ct_eq(rhs.as_bytes()).into()
}

/// Session lifecycle orchestration: credential checks, token issuance,
/// rotation, and teardown. Holds the store behind its trait so tests can
/// run against the in-memory implementation.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn IdentityStore>,
    codec: TokenCodec,
}

impl SessionService {
    pub fn new(store: Arc<dyn IdentityStore>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    fn issue_pair(&self, id: &str, username: &str) -> Result<TokenPair, ServiceError> {
        let access_token = self
            .codec
            .sign_access(id, username)
            .map_err(|e| ServiceError::Internal(anyhow::Error::new(e)))?;
        let refresh_token = self
            .codec
            .sign_refresh(id, username)
            .map_err(|e| ServiceError::Internal(anyhow::Error::new(e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Look up an identity by username and check the password.
    ///
    /// "No such user", "not yet registered", and "wrong password" all
    /// surface as the same `InvalidCredentials`, so responses cannot be
    /// used to enumerate usernames.
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, ServiceError> {
        let Some(identity) = self.store.find_by_username(username).await? else {
            return Err(ServiceError::InvalidCredentials);
        };

        let Some(digest) = identity.password_digest.clone() else {
            tracing::warn!(username = %username, "Login attempt against unregistered identity");
            return Err(ServiceError::InvalidCredentials);
        };

        let password_ok = verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(digest),
        )?;
        if !password_ok {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(identity)
    }

    /// Issue a fresh token pair and persist the digest of its refresh half,
    /// superseding any pair issued earlier for this identity.
    pub async fn login(&self, identity: &Identity) -> Result<TokenPair, ServiceError> {
        let pair = self.issue_pair(&identity.id, &identity.username)?;

        let digest = hash_refresh_token(&pair.refresh_token);
        let matched = self
            .store
            .set_refresh_digest(&identity.id, Some(&digest))
            .await?;
        if !matched {
            // The identity vanished between lookup and write.
            return Err(ServiceError::IdentityNotFound);
        }

        tracing::info!(identity_id = %identity.id, "Session established");
        Ok(pair)
    }

    /// Rotate a refresh token: verify it cryptographically, confirm it is
    /// the one the store currently recognizes, then swap in the digest of
    /// its replacement. Every failure on this path reads the same from
    /// outside.
    pub async fn refresh(&self, presented_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.codec.verify_refresh(presented_token).map_err(|e| {
            tracing::warn!(error = %e, "Refresh token failed verification");
            ServiceError::InvalidRefreshToken
        })?;

        let Some(identity) = self.store.find_by_id(&claims.sub).await? else {
            tracing::warn!(identity_id = %claims.sub, "Refresh for unknown identity");
            return Err(ServiceError::InvalidRefreshToken);
        };

        let Some(stored_digest) = identity.refresh_token_digest.as_deref() else {
            tracing::warn!(identity_id = %identity.id, "Refresh with no active session");
            return Err(ServiceError::InvalidRefreshToken);
        };

        let presented_digest = hash_refresh_token(presented_token);
        if !digests_match(&presented_digest, stored_digest) {
            tracing::warn!(identity_id = %identity.id, "Refresh token superseded");
            return Err(ServiceError::InvalidRefreshToken);
        }

        let pair = self.issue_pair(&identity.id, &identity.username)?;
        let new_digest = hash_refresh_token(&pair.refresh_token);

        // Keyed on the digest just compared: if a concurrent rotation or
        // login landed in between, this matches nothing and the caller
        // loses cleanly.
        let swapped = self
            .store
            .swap_refresh_digest(&identity.id, &presented_digest, &new_digest)
            .await?;
        if !swapped {
            tracing::warn!(identity_id = %identity.id, "Refresh lost a rotation race");
            return Err(ServiceError::InvalidRefreshToken);
        }

        tracing::info!(identity_id = %identity.id, "Session rotated");
        Ok(pair)
    }

    /// Clear the stored refresh digest. Repeating a logout is fine: a
    /// cleared session simply stays cleared. Fails only when the identity
    /// itself does not exist.
    pub async fn logout(&self, identity_id: &str) -> Result<(), ServiceError> {
        let matched = self.store.set_refresh_digest(identity_id, None).await?;
        if !matched {
            return Err(ServiceError::IdentityNotFound);
        }

        tracing::info!(identity_id = %identity_id, "Session terminated");
        Ok(())
    }

    /// Complete registration for a provisioned identity: record the chosen
    /// password and reset secret, then open a first session.
    pub async fn register(
        &self,
        req: RegisterRequest,
    ) -> Result<(TokenPair, Identity), ServiceError> {
        let Some(identity) = self.store.find_by_username(&req.username).await? else {
            return Err(ServiceError::IdentityNotFound);
        };
        if identity.is_registered() {
            return Err(ServiceError::AlreadyRegistered);
        }
        if req.password != req.confirm_password {
            return Err(ServiceError::PasswordMismatch);
        }

        let password_digest = hash_password(&Password::new(req.password))?;
        let secret_digest = hash_password(&Password::new(req.secret))?;

        let updated = self
            .store
            .set_credentials(&identity.id, password_digest.as_str(), secret_digest.as_str())
            .await?;
        if !updated {
            return Err(ServiceError::IdentityNotFound);
        }

        let pair = self.login(&identity).await?;

        tracing::info!(identity_id = %identity.id, "Identity registered");
        Ok((pair, identity))
    }

    /// Confirm that a caller knows an identity's reset secret.
    pub async fn check_reset_eligibility(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<Identity, ServiceError> {
        let Some(identity) = self.store.find_by_username(username).await? else {
            return Err(ServiceError::IdentityNotFound);
        };

        let Some(secret_digest) = identity.reset_secret_digest.clone() else {
            return Err(ServiceError::SecretNotSet);
        };

        let secret_ok = verify_password(
            &Password::new(secret.to_string()),
            &PasswordHashString::new(secret_digest),
        )?;
        if !secret_ok {
            return Err(ServiceError::InvalidSecret);
        }

        Ok(identity)
    }

    /// Replace the password for a caller who knows the reset secret. Any
    /// active session lineage is revoked along the way.
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), ServiceError> {
        let identity = self.check_reset_eligibility(&req.username, &req.secret).await?;

        if req.password != req.confirm_password {
            return Err(ServiceError::PasswordMismatch);
        }

        if let Some(old_digest) = identity.password_digest.clone() {
            let unchanged = verify_password(
                &Password::new(req.password.clone()),
                &PasswordHashString::new(old_digest),
            )?;
            if unchanged {
                return Err(ServiceError::PasswordReuse);
            }
        }

        let password_digest = hash_password(&Password::new(req.password))?;
        let updated = self
            .store
            .reset_password(&identity.id, password_digest.as_str())
            .await?;
        if !updated {
            return Err(ServiceError::IdentityNotFound);
        }

        tracing::info!(identity_id = %identity.id, "Password reset, sessions revoked");
        Ok(())
    }

    /// Load an identity by id, for guarded endpoints acting on the caller.
    pub async fn find_identity(&self, id: &str) -> Result<Identity, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::IdentityNotFound)
    }

    /// Resolve the caller's role, if the referenced role still exists.
    pub async fn load_role(&self, identity_id: &str) -> Result<Option<Role>, ServiceError> {
        let identity = self.find_identity(identity_id).await?;
        Ok(self.store.find_role(&identity.role).await?)
    }

    /// Public projection with the role name resolved.
    pub async fn profile(&self, identity: &Identity) -> Result<PublicProfile, ServiceError> {
        let role = self.store.find_role(&identity.role).await?;
        Ok(identity.profile(role.as_ref().map(|r| r.name.as_str())))
    }
}
