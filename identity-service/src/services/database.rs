use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    Client as MongoClient, Collection, Database, IndexModel,
    bson::{Bson, doc},
    options::IndexOptions,
};
use platform_core::error::AppError;

use crate::models::{Identity, Role};

/// Storage seam for identities and roles. The session manager sees only
/// this trait; production wires [`MongoStore`], tests wire [`MemoryStore`].
///
/// The two digest writers differ on purpose: `set_refresh_digest` replaces
/// whatever is stored, while `swap_refresh_digest` is conditional on the
/// digest the caller read, so concurrent rotations cannot both win.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, AppError>;

    async fn find_role(&self, role_id: &str) -> Result<Option<Role>, AppError>;

    async fn insert_identity(&self, identity: &Identity) -> Result<(), AppError>;

    async fn insert_role(&self, role: &Role) -> Result<(), AppError>;

    /// Replace the stored refresh digest unconditionally. `None` clears it.
    /// Returns false when no identity matched the id.
    async fn set_refresh_digest(
        &self,
        id: &str,
        digest: Option<&str>,
    ) -> Result<bool, AppError>;

    /// Replace the refresh digest only if it still equals `expected`.
    /// Returns false when the identity is missing or the digest moved on.
    async fn swap_refresh_digest(
        &self,
        id: &str,
        expected: &str,
        new_digest: &str,
    ) -> Result<bool, AppError>;

    /// Record the password and reset-secret digests chosen at registration.
    async fn set_credentials(
        &self,
        id: &str,
        password_digest: &str,
        reset_secret_digest: &str,
    ) -> Result<bool, AppError>;

    /// Overwrite the password digest and clear any active session lineage.
    async fn reset_password(&self, id: &str, password_digest: &str) -> Result<bool, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// MongoDB-backed store.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await?;
        let db = client.database(database);
        Ok(Self { db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(
                IndexOptions::builder()
                    .name("username_lookup".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.identities().create_index(username_index, None).await?;

        tracing::info!("Database indexes initialized");
        Ok(())
    }

    pub fn identities(&self) -> Collection<Identity> {
        self.db.collection("identities")
    }

    pub fn roles(&self) -> Collection<Role> {
        self.db.collection("roles")
    }

    fn touch() -> Bson {
        Bson::DateTime(mongodb::bson::DateTime::from_chrono(Utc::now()))
    }
}

#[async_trait]
impl IdentityStore for MongoStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        Ok(self
            .identities()
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, AppError> {
        Ok(self.identities().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_role(&self, role_id: &str) -> Result<Option<Role>, AppError> {
        Ok(self.roles().find_one(doc! { "_id": role_id }, None).await?)
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<(), AppError> {
        self.identities().insert_one(identity, None).await?;
        Ok(())
    }

    async fn insert_role(&self, role: &Role) -> Result<(), AppError> {
        self.roles().insert_one(role, None).await?;
        Ok(())
    }

    async fn set_refresh_digest(
        &self,
        id: &str,
        digest: Option<&str>,
    ) -> Result<bool, AppError> {
        let digest = digest.map_or(Bson::Null, |d| Bson::String(d.to_string()));
        let result = self
            .identities()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "refresh_token_digest": digest, "updated_at": Self::touch() } },
                None,
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    async fn swap_refresh_digest(
        &self,
        id: &str,
        expected: &str,
        new_digest: &str,
    ) -> Result<bool, AppError> {
        // One conditional update: filtering on the old digest makes the
        // read-compare-write of a rotation atomic on the server.
        let result = self
            .identities()
            .update_one(
                doc! { "_id": id, "refresh_token_digest": expected },
                doc! { "$set": { "refresh_token_digest": new_digest, "updated_at": Self::touch() } },
                None,
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    async fn set_credentials(
        &self,
        id: &str,
        password_digest: &str,
        reset_secret_digest: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .identities()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "password_digest": password_digest,
                    "reset_secret_digest": reset_secret_digest,
                    "updated_at": Self::touch(),
                } },
                None,
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    async fn reset_password(&self, id: &str, password_digest: &str) -> Result<bool, AppError> {
        let result = self
            .identities()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "password_digest": password_digest,
                    "refresh_token_digest": Bson::Null,
                    "updated_at": Self::touch(),
                } },
                None,
            )
            .await?;

        Ok(result.matched_count == 1)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

/// In-memory store with the same conditional-update semantics as Mongo.
/// Every mutation happens under one lock, so a swap observes and writes
/// without interleaving.
#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: Mutex<HashMap<String, Identity>>,
    roles: Mutex<HashMap<String, Role>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned<T>(_: PoisonError<T>) -> AppError {
    AppError::InternalError(anyhow::anyhow!("Identity store mutex poisoned"))
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        let identities = self.identities.lock().map_err(lock_poisoned)?;
        Ok(identities.values().find(|i| i.username == username).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, AppError> {
        let identities = self.identities.lock().map_err(lock_poisoned)?;
        Ok(identities.get(id).cloned())
    }

    async fn find_role(&self, role_id: &str) -> Result<Option<Role>, AppError> {
        let roles = self.roles.lock().map_err(lock_poisoned)?;
        Ok(roles.get(role_id).cloned())
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<(), AppError> {
        let mut identities = self.identities.lock().map_err(lock_poisoned)?;
        identities.insert(identity.id.clone(), identity.clone());
        Ok(())
    }

    async fn insert_role(&self, role: &Role) -> Result<(), AppError> {
        let mut roles = self.roles.lock().map_err(lock_poisoned)?;
        roles.insert(role.id.clone(), role.clone());
        Ok(())
    }

    async fn set_refresh_digest(
        &self,
        id: &str,
        digest: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut identities = self.identities.lock().map_err(lock_poisoned)?;
        match identities.get_mut(id) {
            Some(identity) => {
                identity.refresh_token_digest = digest.map(str::to_owned);
                identity.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn swap_refresh_digest(
        &self,
        id: &str,
        expected: &str,
        new_digest: &str,
    ) -> Result<bool, AppError> {
        let mut identities = self.identities.lock().map_err(lock_poisoned)?;
        match identities.get_mut(id) {
            Some(identity) if identity.refresh_token_digest.as_deref() == Some(expected) => {
                identity.refresh_token_digest = Some(new_digest.to_string());
                identity.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_credentials(
        &self,
        id: &str,
        password_digest: &str,
        reset_secret_digest: &str,
    ) -> Result<bool, AppError> {
        let mut identities = self.identities.lock().map_err(lock_poisoned)?;
        match identities.get_mut(id) {
            Some(identity) => {
                identity.password_digest = Some(password_digest.to_string());
                identity.reset_secret_digest = Some(reset_secret_digest.to_string());
                identity.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reset_password(&self, id: &str, password_digest: &str) -> Result<bool, AppError> {
        let mut identities = self.identities.lock().map_err(lock_poisoned)?;
        match identities.get_mut(id) {
            Some(identity) => {
                identity.password_digest = Some(password_digest.to_string());
                identity.refresh_token_digest = None;
                identity.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
