use axum::extract::{Extension, Path};
use axum::response::Json;
use chrono::{Days, Local, NaiveDate};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use wasteless_core::expiry::{
    alert_due, days_until_expiry, record_status, reminder_date, urgency_for, AlertThresholds,
    UrgencyLevel,
};
use wasteless_core::schema::{expiration_records, expiration_settings, inventory_items, users};
use wasteless_core::types::{ExpirationRecord, ExpirationSettings, InventoryItem, ItemStatus};
use wasteless_core::AppContext;
use wasteless_jobs::{SweepReport, Sweeper};

use crate::error::ApiError;
use crate::handlers::db_conn;

#[derive(Debug, Deserialize)]
pub struct ExpirationRequest {
    pub inventory_item_id: i64,
    pub reminder_days_before: i32,
}

#[derive(Debug, Serialize)]
pub struct ExpirationResponse {
    pub id: i64,
    pub inventory_item_id: i64,
    pub expiry_date: NaiveDate,
    pub reminder_days_before: i32,
    pub reminder_date: NaiveDate,
    pub notified: bool,
    pub status: String,
}

impl ExpirationResponse {
    fn from_record(record: ExpirationRecord, expiry_date: NaiveDate) -> Self {
        ExpirationResponse {
            id: record.id,
            inventory_item_id: record.inventory_item_id,
            expiry_date,
            reminder_days_before: record.reminder_days_before,
            reminder_date: record.reminder_date,
            notified: record.notified,
            status: record.status,
        }
    }
}

/// POST /api/v1/expiration/create
pub async fn create_record(
    Extension(ctx): Extension<AppContext>,
    Json(request): Json<ExpirationRequest>,
) -> Result<Json<ExpirationResponse>, ApiError> {
    if request.reminder_days_before < 0 {
        return Err(ApiError::validation("reminder_days_before must be non-negative"));
    }

    let mut conn = db_conn(&ctx).await?;
    let item: Option<InventoryItem> = inventory_items::table
        .find(request.inventory_item_id)
        .select(InventoryItem::as_select())
        .first(&mut conn)
        .await
        .optional()?;
    let item = item.ok_or_else(|| ApiError::not_found("inventory item", request.inventory_item_id))?;

    let today = Local::now().date_naive();
    let status = record_status(today, item.expiry_date);
    let due_on = reminder_date(item.expiry_date, request.reminder_days_before);

    let record: ExpirationRecord = diesel::insert_into(expiration_records::table)
        .values((
            expiration_records::inventory_item_id.eq(item.id),
            expiration_records::reminder_days_before.eq(request.reminder_days_before),
            expiration_records::reminder_date.eq(due_on),
            expiration_records::status.eq(status.as_str()),
            expiration_records::notified.eq(false),
        ))
        .returning(ExpirationRecord::as_returning())
        .get_result(&mut conn)
        .await?;

    Ok(Json(ExpirationResponse::from_record(record, item.expiry_date)))
}

/// GET /api/v1/expiration/all
pub async fn all_records(
    Extension(ctx): Extension<AppContext>,
) -> Result<Json<Vec<ExpirationResponse>>, ApiError> {
    let mut conn = db_conn(&ctx).await?;
    let rows: Vec<(ExpirationRecord, NaiveDate)> = expiration_records::table
        .inner_join(inventory_items::table)
        .order(expiration_records::id.asc())
        .select((ExpirationRecord::as_select(), inventory_items::expiry_date))
        .load(&mut conn)
        .await?;

    let result = rows
        .into_iter()
        .map(|(record, expiry)| ExpirationResponse::from_record(record, expiry))
        .collect();

    Ok(Json(result))
}

/// POST /api/v1/expiration/send-reminders — manual sweep trigger. The
/// sweep's single-flight guard reports an overlapping trigger instead
/// of running twice.
pub async fn send_reminders(
    Extension(sweeper): Extension<Sweeper>,
) -> Result<Json<SweepReport>, ApiError> {
    let report = sweeper
        .run_once()
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
pub struct UpcomingExpirationResponse {
    pub item_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub storage_location: Option<String>,
    pub days_until_expiry: i64,
    pub urgency_level: UrgencyLevel,
}

impl UpcomingExpirationResponse {
    fn from_item(item: InventoryItem, today: NaiveDate) -> Self {
        let days = days_until_expiry(today, item.expiry_date);
        UpcomingExpirationResponse {
            item_id: item.id,
            name: item.name,
            category: item.category,
            quantity: item.quantity,
            expiry_date: item.expiry_date,
            storage_location: item.storage_location,
            days_until_expiry: days,
            urgency_level: urgency_for(days),
        }
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

/// GET /api/v1/expiration/upcoming/{userId} — the user's active items
/// expiring within the next seven days, both range ends inclusive.
pub async fn upcoming(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<UpcomingExpirationResponse>>, ApiError> {
    require_user(&ctx, user_id).await?;

    let today = Local::now().date_naive();
    let horizon = today + Days::new(7);

    let mut conn = db_conn(&ctx).await?;
    let items: Vec<InventoryItem> = inventory_items::table
        .filter(inventory_items::user_id.eq(user_id))
        .filter(inventory_items::status.eq(ItemStatus::Active.as_str()))
        .filter(inventory_items::expiry_date.between(today, horizon))
        .order(inventory_items::expiry_date.asc())
        .select(InventoryItem::as_select())
        .load(&mut conn)
        .await?;

    let result = items
        .into_iter()
        .map(|item| UpcomingExpirationResponse::from_item(item, today))
        .collect();

    Ok(Json(result))
}

/// GET /api/v1/expiration/alerts/{userId} — items flagged today by the
/// user's alert settings. Exact-day match, not a range.
pub async fn alerts(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<UpcomingExpirationResponse>>, ApiError> {
    let settings = get_or_create_settings(&ctx, user_id).await?;
    let thresholds = AlertThresholds {
        first_alert_days: settings.first_alert_days,
        second_alert_days: settings.second_alert_days,
        alert_on_expiry_day: settings.alert_on_expiry_day,
    };

    let today = Local::now().date_naive();
    let mut conn = db_conn(&ctx).await?;
    let items: Vec<InventoryItem> = inventory_items::table
        .filter(inventory_items::user_id.eq(user_id))
        .filter(inventory_items::status.eq(ItemStatus::Active.as_str()))
        .order(inventory_items::expiry_date.asc())
        .select(InventoryItem::as_select())
        .load(&mut conn)
        .await?;

    let result = items
        .into_iter()
        .filter(|item| alert_due(&thresholds, days_until_expiry(today, item.expiry_date)))
        .map(|item| UpcomingExpirationResponse::from_item(item, today))
        .collect();

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ExpirationSettingsRequest {
    pub first_alert_days: Option<i32>,
    pub second_alert_days: Option<i32>,
    pub email_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
    pub alert_on_expiry_day: Option<bool>,
}

/// Atomic get-or-insert: the conditional insert makes concurrent
/// first-time requests for the same user converge on a single row.
async fn get_or_create_settings(
    ctx: &AppContext,
    user_id: i64,
) -> Result<ExpirationSettings, ApiError> {
    require_user(ctx, user_id).await?;
    let defaults = AlertThresholds::default();

    let mut conn = db_conn(ctx).await?;
    diesel::insert_into(expiration_settings::table)
        .values((
            expiration_settings::user_id.eq(user_id),
            expiration_settings::first_alert_days.eq(defaults.first_alert_days),
            expiration_settings::second_alert_days.eq(defaults.second_alert_days),
            expiration_settings::email_enabled.eq(true),
            expiration_settings::push_enabled.eq(true),
            expiration_settings::alert_on_expiry_day.eq(defaults.alert_on_expiry_day),
        ))
        .on_conflict(expiration_settings::user_id)
        .do_nothing()
        .execute(&mut conn)
        .await?;

    let settings = expiration_settings::table
        .find(user_id)
        .select(ExpirationSettings::as_select())
        .first(&mut conn)
        .await?;

    Ok(settings)
}

/// GET /api/v1/expiration/settings/{userId}
pub async fn get_settings(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ExpirationSettings>, ApiError> {
    let settings = get_or_create_settings(&ctx, user_id).await?;
    Ok(Json(settings))
}

/// PUT /api/v1/expiration/settings/{userId} — partial update; absent
/// fields keep their current values.
pub async fn update_settings(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
    Json(request): Json<ExpirationSettingsRequest>,
) -> Result<Json<ExpirationSettings>, ApiError> {
    let current = get_or_create_settings(&ctx, user_id).await?;

    let first_alert = request.first_alert_days.unwrap_or(current.first_alert_days);
    let second_alert = request.second_alert_days.unwrap_or(current.second_alert_days);
    if first_alert < 0 || second_alert < 0 {
        return Err(ApiError::validation("alert day offsets must be non-negative"));
    }

    let mut conn = db_conn(&ctx).await?;
    let updated: ExpirationSettings = diesel::update(expiration_settings::table.find(user_id))
        .set((
            expiration_settings::first_alert_days.eq(first_alert),
            expiration_settings::second_alert_days.eq(second_alert),
            expiration_settings::email_enabled
                .eq(request.email_enabled.unwrap_or(current.email_enabled)),
            expiration_settings::push_enabled
                .eq(request.push_enabled.unwrap_or(current.push_enabled)),
            expiration_settings::alert_on_expiry_day
                .eq(request.alert_on_expiry_day.unwrap_or(current.alert_on_expiry_day)),
            expiration_settings::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(ExpirationSettings::as_returning())
        .get_result(&mut conn)
        .await?;

    Ok(Json(updated))
}
