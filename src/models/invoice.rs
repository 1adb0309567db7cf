use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identified;

/// Invoice row from a shop's tenant database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub member_id: Uuid,
    pub total: Decimal,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub number: String,
    pub member_id: Uuid,
    pub total: Decimal,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceUpdate {
    pub id: Option<Uuid>,
    pub number: Option<String>,
    pub total: Option<Decimal>,
    pub due_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Identified for InvoiceUpdate {
    fn id(&self) -> Option<Uuid> {
        self.id
    }
}
