use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identified;

/// Product row from a shop's tenant database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub thc_mg: Decimal,
    pub price: Decimal,
    pub stock_qty: i32,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub thc_mg: Decimal,
    pub price: Decimal,
    pub stock_qty: i32,
    pub barcode: Option<String>,
}

/// One entry of a bulk product update; absent fields keep their stored
/// value.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdate {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub thc_mg: Option<Decimal>,
    pub price: Option<Decimal>,
    pub stock_qty: Option<i32>,
    pub barcode: Option<String>,
}

impl Identified for ProductUpdate {
    fn id(&self) -> Option<Uuid> {
        self.id
    }
}
