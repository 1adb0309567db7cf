use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff account row from the host database.
///
/// Deliberately not Serialize: responses go through [`UserPublic`], which
/// has no way to carry the password hash.
#[derive(Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub nfc_uid: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("shop_id", &self.shop_id)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish()
    }
}

/// Client-facing view of a staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub username: String,
    pub role: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            shop_id: user.shop_id,
            username: user.username,
            role: user.role,
        }
    }
}
