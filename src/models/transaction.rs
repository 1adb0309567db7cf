use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// One line of a sale, stored inline as jsonb on the transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub qty: i32,
    pub unit_price: Decimal,
}

/// Completed sale from a shop's tenant database. Transactions are an
/// append-only ledger: rows are created, listed and fetched, never edited.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub member_id: Option<Uuid>,
    pub items: Json<Vec<LineItem>>,
    pub total: Decimal,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub member_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub payment_method: String,
}

/// Sum of qty * unit_price across the lines. The server computes totals;
/// client-supplied totals are ignored. Returns None when the sum leaves
/// the representable range, so absurd inputs surface as a validation
/// error instead of a panic.
pub fn items_total(items: &[LineItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.unit_price
            .checked_mul(Decimal::from(item.qty))
            .and_then(|line| total.checked_add(line))
    })
}
