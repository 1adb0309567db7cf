// /api/products - product catalog (tenant-scoped)

use axum::extract::{Extension, Path, Query};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::{split_identified, NewProduct, Product, ProductUpdate};
use crate::tenant::ResolvedClient;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub barcode: Option<String>,
    pub category: Option<String>,
}

/// GET /api/products - list, with optional barcode / category filters
pub async fn list(
    Extension(client): Extension<ResolvedClient>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<Vec<Product>> {
    let mut builder = sqlx::QueryBuilder::new("SELECT * FROM products");
    let filters = [("barcode", &query.barcode), ("category", &query.category)];

    let mut sep = " WHERE ";
    for (column, value) in filters {
        if let Some(value) = value {
            builder.push(sep).push(column).push(" = ").push_bind(value.clone());
            sep = " AND ";
        }
    }
    builder.push(" ORDER BY name");

    let products = builder
        .build_query_as::<Product>()
        .fetch_all(client.pool())
        .await?;
    Ok(ApiResponse::success(products))
}

/// GET /api/products/:id
pub async fn get(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Product> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(client.pool())
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(ApiResponse::success(product))
}

/// POST /api/products
pub async fn create(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<NewProduct>,
) -> ApiResult<Product> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Product name is required"));
    }
    if payload.price < Decimal::ZERO {
        return Err(ApiError::validation("Price cannot be negative"));
    }
    if payload.stock_qty < 0 {
        return Err(ApiError::validation("Stock quantity cannot be negative"));
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, category, thc_mg, price, stock_qty, barcode)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.category)
    .bind(payload.thc_mg)
    .bind(payload.price)
    .bind(payload.stock_qty)
    .bind(&payload.barcode)
    .fetch_one(client.pool())
    .await?;

    Ok(ApiResponse::created(product))
}

/// PUT /api/products - bulk update
///
/// Body is an array of partial payloads. Entries without an id are
/// skipped; for the rest, absent fields keep their stored value. Returns
/// the updated rows.
pub async fn update_bulk(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<Vec<ProductUpdate>>,
) -> ApiResult<Vec<Product>> {
    let (updates, skipped) = split_identified(payload);
    if skipped > 0 {
        tracing::debug!("Skipped {} product update entries missing an id", skipped);
    }

    let mut updated = Vec::with_capacity(updates.len());
    for entry in updates {
        let Some(id) = entry.id else { continue };
        let row = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                thc_mg = COALESCE($4, thc_mg),
                price = COALESCE($5, price),
                stock_qty = COALESCE($6, stock_qty),
                barcode = COALESCE($7, barcode),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entry.name)
        .bind(entry.category)
        .bind(entry.thc_mg)
        .bind(entry.price)
        .bind(entry.stock_qty)
        .bind(entry.barcode)
        .fetch_optional(client.pool())
        .await?;

        if let Some(product) = row {
            updated.push(product);
        }
    }

    Ok(ApiResponse::success(updated))
}

/// DELETE /api/products/:id
pub async fn delete(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(client.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
