use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An authenticatable principal, stored in the `identities` collection.
///
/// Accounts are provisioned by administration with `password_digest` unset;
/// the owner completes registration by choosing a password and a reset
/// secret. `refresh_token_digest` holds the digest of the single refresh
/// token this identity may currently redeem, or nothing when no session
/// lineage is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub name: String,
    pub password_digest: Option<String>,
    pub refresh_token_digest: Option<String>,
    pub reset_secret_digest: Option<String>,
    /// Reference into the `roles` collection.
    pub role: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(username: String, name: String, role: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            name,
            password_digest: None,
            refresh_token_digest: None,
            reset_secret_digest: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the owner has completed registration.
    pub fn is_registered(&self) -> bool {
        self.password_digest.is_some()
    }

    /// Whether a refresh token lineage is currently redeemable.
    pub fn has_active_session(&self) -> bool {
        self.refresh_token_digest.is_some()
    }

    /// Projection safe to hand to clients. Digests never leave the store.
    pub fn profile(&self, role_name: Option<&str>) -> PublicProfile {
        PublicProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            role: role_name.map(str::to_owned),
        }
    }
}

/// What transports may reveal about an identity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    #[schema(example = "7e4f1fcb-9c3e-4ab8-9aa1-6f1f0f3a2d10")]
    pub id: String,
    #[schema(example = "6531501001")]
    pub username: String,
    #[schema(example = "Chada Nilubol")]
    pub name: String,
    #[schema(example = "Student")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioned_identity_is_not_registered() {
        let identity = Identity::new("6531501001".into(), "Chada N.".into(), "role-1".into());
        assert!(!identity.is_registered());
        assert!(!identity.has_active_session());
    }

    #[test]
    fn profile_omits_digests() {
        let mut identity = Identity::new("6531501001".into(), "Chada N.".into(), "role-1".into());
        identity.password_digest = Some("$argon2id$...".into());

        let profile = identity.profile(Some("Student"));
        let json = serde_json::to_value(&profile).expect("profile serializes");

        assert_eq!(json["username"], "6531501001");
        assert_eq!(json["role"], "Student");
        assert!(json.get("passwordDigest").is_none());
        assert!(json.get("password_digest").is_none());
    }
}
