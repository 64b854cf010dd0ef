use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authorization grouping stored in the `roles` collection. `permissions`
/// holds plain permission tags; role administration owns any at-rest
/// encoding before documents land here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub permissions: Vec<String>,
}

impl Role {
    pub fn new(name: String, permissions: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            permissions,
        }
    }

    pub fn allows(&self, tag: &str) -> bool {
        self.permissions.iter().any(|p| p == tag)
    }
}
