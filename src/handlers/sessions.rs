// /api/sessions - PoS terminal session log (host-scoped)

use axum::extract::{Path, Query};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::{NewSession, PosSession};
use crate::tenant;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// GET /api/sessions - recent sessions, newest first
pub async fn list(Query(query): Query<SessionListQuery>) -> ApiResult<Vec<PosSession>> {
    let pool = tenant::host_pool().await?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let mut builder = sqlx::QueryBuilder::new("SELECT * FROM pos_sessions");
    if let Some(user_id) = query.user_id {
        builder.push(" WHERE user_id = ").push_bind(user_id);
    }
    builder.push(" ORDER BY started_at DESC LIMIT ").push_bind(limit);

    let sessions = builder
        .build_query_as::<PosSession>()
        .fetch_all(&pool)
        .await?;
    Ok(ApiResponse::success(sessions))
}

/// POST /api/sessions - record a session start
pub async fn create(Json(payload): Json<NewSession>) -> ApiResult<PosSession> {
    if payload.terminal.trim().is_empty() {
        return Err(ApiError::validation("Terminal label is required"));
    }

    let pool = tenant::host_pool().await?;
    let session = sqlx::query_as::<_, PosSession>(
        r#"
        INSERT INTO pos_sessions (user_id, shop_id, terminal)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.shop_id)
    .bind(&payload.terminal)
    .fetch_one(&pool)
    .await?;

    Ok(ApiResponse::created(session))
}

/// PUT /api/sessions/:id/end - stamp a session's end time
pub async fn end(Path(id): Path<Uuid>) -> ApiResult<PosSession> {
    let pool = tenant::host_pool().await?;
    let session = sqlx::query_as::<_, PosSession>(
        r#"
        UPDATE pos_sessions
        SET ended_at = NOW()
        WHERE id = $1 AND ended_at IS NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Session not found or already ended"))?;

    Ok(ApiResponse::success(session))
}
