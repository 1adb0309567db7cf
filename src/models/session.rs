use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// PoS terminal session log entry (host database).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PosSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shop_id: Uuid,
    pub terminal: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub user_id: Uuid,
    pub shop_id: Uuid,
    pub terminal: String,
}
