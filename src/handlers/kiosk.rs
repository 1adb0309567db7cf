// /api/kiosk/orders - self-service kiosk order queue (tenant-scoped)

use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::{split_identified, KioskOrder, KioskOrderUpdate, NewKioskOrder, OrderStatus};
use crate::tenant::ResolvedClient;

use super::transactions::{insert_transaction, validate_items};

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// GET /api/kiosk/orders - list, optionally filtered by status
pub async fn list(
    Extension(client): Extension<ResolvedClient>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Vec<KioskOrder>> {
    let status = query
        .status
        .as_deref()
        .map(|raw| raw.parse::<OrderStatus>().map_err(ApiError::validation))
        .transpose()?;

    let mut builder = sqlx::QueryBuilder::new("SELECT * FROM kiosk_orders");
    if let Some(status) = status {
        builder.push(" WHERE status = ").push_bind(status);
    }
    builder.push(" ORDER BY placed_at");

    let orders = builder
        .build_query_as::<KioskOrder>()
        .fetch_all(client.pool())
        .await?;
    Ok(ApiResponse::success(orders))
}

/// GET /api/kiosk/orders/:id
pub async fn get(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<KioskOrder> {
    let order = sqlx::query_as::<_, KioskOrder>("SELECT * FROM kiosk_orders WHERE id = $1")
        .bind(id)
        .fetch_optional(client.pool())
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    Ok(ApiResponse::success(order))
}

/// POST /api/kiosk/orders - place an order (starts pending)
pub async fn create(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<NewKioskOrder>,
) -> ApiResult<KioskOrder> {
    validate_items(&payload.items)?;

    let order = sqlx::query_as::<_, KioskOrder>(
        r#"
        INSERT INTO kiosk_orders (member_id, items, status, note)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(payload.member_id)
    .bind(SqlJson(payload.items))
    .bind(OrderStatus::Pending)
    .bind(&payload.note)
    .fetch_one(client.pool())
    .await?;

    Ok(ApiResponse::created(order))
}

/// PUT /api/kiosk/orders - bulk update; entries without an id are skipped
pub async fn update_bulk(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<Vec<KioskOrderUpdate>>,
) -> ApiResult<Vec<KioskOrder>> {
    let (updates, skipped) = split_identified(payload);
    if skipped > 0 {
        tracing::debug!("Skipped {} order update entries missing an id", skipped);
    }

    let mut updated = Vec::with_capacity(updates.len());
    for entry in updates {
        let Some(id) = entry.id else { continue };
        let row = sqlx::query_as::<_, KioskOrder>(
            r#"
            UPDATE kiosk_orders
            SET note = COALESCE($2, note),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entry.note)
        .fetch_optional(client.pool())
        .await?;

        if let Some(order) = row {
            updated.push(order);
        }
    }

    Ok(ApiResponse::success(updated))
}

/// PUT /api/kiosk/orders/:id/status - advance (or cancel) an order
///
/// The transition check runs with the row locked, so it serializes against
/// a concurrent complete on the same order instead of overwriting the
/// state it commits.
pub async fn update_status(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdate>,
) -> ApiResult<KioskOrder> {
    let mut tx = client.pool().begin().await?;

    let order =
        sqlx::query_as::<_, KioskOrder>("SELECT * FROM kiosk_orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Order not found"))?;

    if !order.status.can_transition_to(payload.status) {
        return Err(ApiError::conflict(format!(
            "Order cannot move from {} to {}",
            order.status, payload.status
        )));
    }

    let order = sqlx::query_as::<_, KioskOrder>(
        r#"
        UPDATE kiosk_orders
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.status)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ApiResponse::success(order))
}

/// POST /api/kiosk/orders/:id/complete - turn a ready order into a sale
///
/// Creates a transaction from the order's items (decrementing stock) and
/// marks the order completed, all inside one database transaction.
pub async fn complete(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let mut tx = client.pool().begin().await?;

    let order =
        sqlx::query_as::<_, KioskOrder>("SELECT * FROM kiosk_orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Order not found"))?;

    if order.status != OrderStatus::Ready {
        return Err(ApiError::conflict(format!(
            "Order must be ready to complete (currently {})",
            order.status
        )));
    }

    let transaction = insert_transaction(&mut tx, order.member_id, &order.items.0, "kiosk").await?;

    let order = sqlx::query_as::<_, KioskOrder>(
        r#"
        UPDATE kiosk_orders
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(OrderStatus::Completed)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ApiResponse::success(json!({
        "order": order,
        "transaction": transaction,
    })))
}

/// DELETE /api/kiosk/orders/:id
pub async fn delete(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let result = sqlx::query("DELETE FROM kiosk_orders WHERE id = $1")
        .bind(id)
        .execute(client.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Order not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
