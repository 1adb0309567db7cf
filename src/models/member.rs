use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identified;

/// Dispensary member row from a shop's tenant database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub membership_no: String,
    pub nfc_uid: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub membership_no: String,
    pub nfc_uid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberUpdate {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub membership_no: Option<String>,
    pub nfc_uid: Option<String>,
}

impl Identified for MemberUpdate {
    fn id(&self) -> Option<Uuid> {
        self.id
    }
}
