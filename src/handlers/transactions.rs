// /api/transactions - sales ledger (tenant-scoped, append-only)

use axum::extract::{Extension, Path, Query};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use sqlx::Postgres;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::{items_total, LineItem, NewTransaction, Transaction};
use crate::tenant::ResolvedClient;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub member_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// GET /api/transactions - recent sales, newest first
pub async fn list(
    Extension(client): Extension<ResolvedClient>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<Vec<Transaction>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let mut builder = sqlx::QueryBuilder::new("SELECT * FROM transactions");
    if let Some(member_id) = query.member_id {
        builder.push(" WHERE member_id = ").push_bind(member_id);
    }
    builder.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

    let transactions = builder
        .build_query_as::<Transaction>()
        .fetch_all(client.pool())
        .await?;
    Ok(ApiResponse::success(transactions))
}

/// GET /api/transactions/:id
pub async fn get(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Transaction> {
    let transaction = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(client.pool())
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;
    Ok(ApiResponse::success(transaction))
}

/// POST /api/transactions - record a sale and decrement stock
///
/// Stock decrements and the ledger insert happen in one database
/// transaction; a short line anywhere rolls back the whole sale.
pub async fn create(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<NewTransaction>,
) -> ApiResult<Transaction> {
    validate_items(&payload.items)?;
    if payload.payment_method.trim().is_empty() {
        return Err(ApiError::validation("Payment method is required"));
    }

    let mut tx = client.pool().begin().await?;
    let transaction = insert_transaction(
        &mut tx,
        payload.member_id,
        &payload.items,
        &payload.payment_method,
    )
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::created(transaction))
}

/// Basic line item checks shared by sales and kiosk orders.
pub(crate) fn validate_items(items: &[LineItem]) -> Result<(), ApiError> {
    if items.is_empty() {
        return Err(ApiError::validation("At least one line item is required"));
    }
    for item in items {
        if item.qty < 1 {
            return Err(ApiError::validation(format!(
                "Line item {} has a non-positive quantity",
                item.name
            )));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(ApiError::validation(format!(
                "Line item {} has a negative unit price",
                item.name
            )));
        }
    }
    Ok(())
}

/// Decrement stock per line and insert the ledger row. Runs inside the
/// caller's database transaction; the guarded UPDATE refuses to take stock
/// below zero.
pub(crate) async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    member_id: Option<Uuid>,
    items: &[LineItem],
    payment_method: &str,
) -> Result<Transaction, ApiError> {
    // Total the sale before touching any rows; an unrepresentable total
    // rejects the request rather than rolling back half-applied decrements.
    let total =
        items_total(items).ok_or_else(|| ApiError::validation("Sale total is out of range"))?;

    for item in items {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_qty = stock_qty - $2, updated_at = NOW()
            WHERE id = $1 AND stock_qty >= $2
            "#,
        )
        .bind(item.product_id)
        .bind(item.qty)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::conflict(format!(
                "Insufficient stock for {}",
                item.name
            )));
        }
    }

    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (member_id, items, total, payment_method)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(member_id)
    .bind(SqlJson(items.to_vec()))
    .bind(total)
    .bind(payment_method)
    .fetch_one(&mut **tx)
    .await?;

    Ok(transaction)
}
