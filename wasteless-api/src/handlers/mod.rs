use axum::response::Json;
use wasteless_core::AppContext;

use crate::error::ApiError;

pub mod donations;
pub mod expiration;
pub mod impact;
pub mod inventory;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "wasteless-api"
    }))
}

pub(crate) async fn db_conn(ctx: &AppContext) -> Result<wasteless_core::db::DbConnection, ApiError> {
    ctx.db_pool
        .get()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("connection pool error: {}", e)))
}
