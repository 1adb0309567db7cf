// /api/members - dispensary membership registry (tenant-scoped)

use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::{split_identified, Member, MemberUpdate, NewMember};
use crate::tenant::ResolvedClient;

#[derive(Debug, Deserialize)]
pub struct MemberListQuery {
    pub membership_no: Option<String>,
    pub nfc_uid: Option<String>,
}

/// GET /api/members - list, with optional membership_no / nfc_uid filters
pub async fn list(
    Extension(client): Extension<ResolvedClient>,
    Query(query): Query<MemberListQuery>,
) -> ApiResult<Vec<Member>> {
    let mut builder = sqlx::QueryBuilder::new("SELECT * FROM members");
    let filters = [
        ("membership_no", &query.membership_no),
        ("nfc_uid", &query.nfc_uid),
    ];

    let mut sep = " WHERE ";
    for (column, value) in filters {
        if let Some(value) = value {
            builder.push(sep).push(column).push(" = ").push_bind(value.clone());
            sep = " AND ";
        }
    }
    builder.push(" ORDER BY name");

    let members = builder
        .build_query_as::<Member>()
        .fetch_all(client.pool())
        .await?;
    Ok(ApiResponse::success(members))
}

/// GET /api/members/:id
pub async fn get(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Member> {
    let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
        .bind(id)
        .fetch_optional(client.pool())
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;
    Ok(ApiResponse::success(member))
}

/// POST /api/members
pub async fn create(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<NewMember>,
) -> ApiResult<Member> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Member name is required"));
    }
    if payload.membership_no.trim().is_empty() {
        return Err(ApiError::validation("Membership number is required"));
    }

    let member = sqlx::query_as::<_, Member>(
        r#"
        INSERT INTO members (name, email, membership_no, nfc_uid)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.membership_no)
    .bind(&payload.nfc_uid)
    .fetch_one(client.pool())
    .await?;

    Ok(ApiResponse::created(member))
}

/// PUT /api/members - bulk update; entries without an id are skipped
pub async fn update_bulk(
    Extension(client): Extension<ResolvedClient>,
    Json(payload): Json<Vec<MemberUpdate>>,
) -> ApiResult<Vec<Member>> {
    let (updates, skipped) = split_identified(payload);
    if skipped > 0 {
        tracing::debug!("Skipped {} member update entries missing an id", skipped);
    }

    let mut updated = Vec::with_capacity(updates.len());
    for entry in updates {
        let Some(id) = entry.id else { continue };
        let row = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                membership_no = COALESCE($4, membership_no),
                nfc_uid = COALESCE($5, nfc_uid)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entry.name)
        .bind(entry.email)
        .bind(entry.membership_no)
        .bind(entry.nfc_uid)
        .fetch_optional(client.pool())
        .await?;

        if let Some(member) = row {
            updated.push(member);
        }
    }

    Ok(ApiResponse::success(updated))
}

/// DELETE /api/members/:id
pub async fn delete(
    Extension(client): Extension<ResolvedClient>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let result = sqlx::query("DELETE FROM members WHERE id = $1")
        .bind(id)
        .execute(client.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Member not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
