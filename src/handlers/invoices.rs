// /api/invoices - member invoices (tenant-scoped)

use axum::extract::{Extension, Path};
use axum::Json;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::{split_identified, Invoice, InvoiceUpdate, NewInvoice};
use crate::tenant::ResolvedClient;

/// GET /api/invoices - newest first
pub async fn list(Extension(client): Extension<ResolvedClient>) -> ApiResult<Vec<Invoice>> {
    let invoices =
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices ORDER BY issued_at DESC")
            .fetch_all(client.pool())
            .await?;
    Ok(ApiResponse::success(invoices))
}

/// GET /api/invoices/:id
pub async fn get(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Invoice> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
        .bind(id)
        .fetch_optional(client.pool())
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice not found"))?;
    Ok(ApiResponse::success(invoice))
}

/// POST /api/invoices
pub async fn create(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<NewInvoice>,
) -> ApiResult<Invoice> {
    if payload.number.trim().is_empty() {
        return Err(ApiError::validation("Invoice number is required"));
    }
    if payload.total < Decimal::ZERO {
        return Err(ApiError::validation("Invoice total cannot be negative"));
    }

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices (number, member_id, total, due_at)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&payload.number)
    .bind(payload.member_id)
    .bind(payload.total)
    .bind(payload.due_at)
    .fetch_one(client.pool())
    .await?;

    Ok(ApiResponse::created(invoice))
}

/// PUT /api/invoices - bulk update; entries without an id are skipped
pub async fn update_bulk(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<Vec<InvoiceUpdate>>,
) -> ApiResult<Vec<Invoice>> {
    let (updates, skipped) = split_identified(payload);
    if skipped > 0 {
        tracing::debug!("Skipped {} invoice update entries missing an id", skipped);
    }

    let mut updated = Vec::with_capacity(updates.len());
    for entry in updates {
        let Some(id) = entry.id else { continue };
        let row = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET number = COALESCE($2, number),
                total = COALESCE($3, total),
                due_at = COALESCE($4, due_at),
                paid_at = COALESCE($5, paid_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entry.number)
        .bind(entry.total)
        .bind(entry.due_at)
        .bind(entry.paid_at)
        .fetch_optional(client.pool())
        .await?;

        if let Some(invoice) = row {
            updated.push(invoice);
        }
    }

    Ok(ApiResponse::success(updated))
}

/// DELETE /api/invoices/:id
pub async fn delete(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id)
        .execute(client.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Invoice not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
