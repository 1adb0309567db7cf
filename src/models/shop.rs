use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One row of the host shop registry.
///
/// Carries the shop's tenant database credentials, so this type is never
/// serialized to clients and its Debug output redacts the access key.
#[derive(Clone, sqlx::FromRow)]
pub struct Shop {
    pub id: Uuid,
    pub name: String,
    pub endpoint_url: String,
    pub access_key: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Shop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shop")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active)
            .finish()
    }
}
