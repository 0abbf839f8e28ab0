use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use wasteless_core::schema::{inventory_items, users};
use wasteless_core::types::{InventoryItem, ItemStatus};
use wasteless_core::AppContext;

use crate::error::ApiError;
use crate::handlers::db_conn;

#[derive(Debug, Deserialize)]
pub struct InventoryRequest {
    pub name: String,
    pub quantity: i32,
    pub category: Option<String>,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub storage_location: Option<String>,
    pub estimated_value: Option<f64>,
}

impl InventoryRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() {
            return Err(ApiError::validation("name is required"));
        }
        if self.quantity <= 0 {
            return Err(ApiError::validation("quantity must be positive"));
        }
        Ok(())
    }
}

/// Optional caller identity on item-scoped routes. When present, the
/// item must belong to that user; a mismatch is a forbidden condition,
/// not a not-found.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<i64>,
}

fn ensure_owner(item: &InventoryItem, caller: Option<i64>) -> Result<(), ApiError> {
    match caller {
        Some(user_id) if user_id != item.user_id => Err(ApiError::Forbidden(format!(
            "inventory item {} does not belong to user {}",
            item.id, user_id
        ))),
        _ => Ok(()),
    }
}

async fn require_user(ctx: &AppContext, user_id: i64) -> Result<(), ApiError> {
    let mut conn = db_conn(ctx).await?;
    let found: Option<i64> = users::table
        .find(user_id)
        .select(users::id)
        .first(&mut conn)
        .await
        .optional()?;
    found
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("user", user_id))
}

/// GET /api/v1/inventory/{userId}/all
pub async fn all_items(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    require_user(&ctx, user_id).await?;

    let mut conn = db_conn(&ctx).await?;
    let items = inventory_items::table
        .filter(inventory_items::user_id.eq(user_id))
        .order(inventory_items::id.asc())
        .select(InventoryItem::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(items))
}

/// POST /api/v1/inventory/{userId}/add
pub async fn add_item(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
    Json(request): Json<InventoryRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    request.validate()?;
    require_user(&ctx, user_id).await?;

    let mut conn = db_conn(&ctx).await?;
    let item: InventoryItem = diesel::insert_into(inventory_items::table)
        .values((
            inventory_items::user_id.eq(user_id),
            inventory_items::name.eq(&request.name),
            inventory_items::quantity.eq(request.quantity),
            inventory_items::category.eq(&request.category),
            inventory_items::purchase_date.eq(request.purchase_date),
            inventory_items::expiry_date.eq(request.expiry_date),
            inventory_items::storage_location.eq(&request.storage_location),
            inventory_items::status.eq(ItemStatus::Active.as_str()),
            inventory_items::estimated_value.eq(request.estimated_value),
        ))
        .returning(InventoryItem::as_returning())
        .get_result(&mut conn)
        .await?;

    Ok(Json(item))
}

/// GET /api/v1/inventory/item/{id}
pub async fn item_by_id(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<i64>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<InventoryItem>, ApiError> {
    let mut conn = db_conn(&ctx).await?;
    let item: Option<InventoryItem> = inventory_items::table
        .find(id)
        .select(InventoryItem::as_select())
        .first(&mut conn)
        .await
        .optional()?;

    let item = item.ok_or_else(|| ApiError::not_found("inventory item", id))?;
    ensure_owner(&item, owner.user_id)?;
    Ok(Json(item))
}

/// PUT /api/v1/inventory/update/{id}
pub async fn update_item(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<i64>,
    Json(request): Json<InventoryRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    request.validate()?;

    let mut conn = db_conn(&ctx).await?;
    let updated: Option<InventoryItem> = diesel::update(inventory_items::table.find(id))
        .set((
            inventory_items::name.eq(&request.name),
            inventory_items::quantity.eq(request.quantity),
            inventory_items::category.eq(&request.category),
            inventory_items::purchase_date.eq(request.purchase_date),
            inventory_items::expiry_date.eq(request.expiry_date),
            inventory_items::storage_location.eq(&request.storage_location),
        ))
        .returning(InventoryItem::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;

    let item = updated.ok_or_else(|| ApiError::not_found("inventory item", id))?;
    Ok(Json(item))
}

/// DELETE /api/v1/inventory/delete/{id}
pub async fn delete_item(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = db_conn(&ctx).await?;
    let deleted = diesel::delete(inventory_items::table.find(id))
        .execute(&mut conn)
        .await?;

    if deleted == 0 {
        return Err(ApiError::not_found("inventory item", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemStatusRequest {
    pub status: ItemStatus,
    pub estimated_value: Option<f64>,
}

/// Maps a zero-row conditional status update to its error: the item is
/// either gone or no longer ACTIVE because another transition won.
fn transition_conflict(id: i64, current_status: Option<&str>) -> ApiError {
    match current_status {
        Some(status) => ApiError::validation(format!(
            "item {} has already been consumed (status {})",
            id, status
        )),
        None => ApiError::not_found("inventory item", id),
    }
}

/// PATCH /api/v1/inventory/item/{id}/status
///
/// The single lifecycle transition: ACTIVE -> EATEN | WASTED |
/// DONATED. The update carries an ACTIVE predicate, so of two
/// concurrent transitions only one matches a row and `consumed_at` is
/// written exactly once.
pub async fn update_item_status(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<i64>,
    Query(owner): Query<OwnerQuery>,
    Json(request): Json<UpdateItemStatusRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    if request.status == ItemStatus::Active {
        return Err(ApiError::validation("status must be EATEN, WASTED or DONATED"));
    }

    let mut conn = db_conn(&ctx).await?;
    let item: Option<InventoryItem> = inventory_items::table
        .find(id)
        .select(InventoryItem::as_select())
        .first(&mut conn)
        .await
        .optional()?;
    let item = item.ok_or_else(|| ApiError::not_found("inventory item", id))?;
    ensure_owner(&item, owner.user_id)?;

    let estimated_value = request.estimated_value.or(item.estimated_value);
    let updated: Option<InventoryItem> = diesel::update(
        inventory_items::table
            .find(id)
            .filter(inventory_items::status.eq(ItemStatus::Active.as_str())),
    )
    .set((
        inventory_items::status.eq(request.status.as_str()),
        inventory_items::consumed_at.eq(Some(Utc::now())),
        inventory_items::estimated_value.eq(estimated_value),
    ))
    .returning(InventoryItem::as_returning())
    .get_result(&mut conn)
    .await
    .optional()?;

    match updated {
        Some(item) => Ok(Json(item)),
        None => {
            let current: Option<String> = inventory_items::table
                .find(id)
                .select(inventory_items::status)
                .first(&mut conn)
                .await
                .optional()?;
            Err(transition_conflict(id, current.as_deref()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_conflict_on_consumed_item_is_validation() {
        let err = transition_conflict(7, Some("EATEN"));
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_transition_conflict_on_missing_item_is_not_found() {
        let err = transition_conflict(7, None);
        assert!(matches!(err, ApiError::NotFound(_, 7)));
    }
}
