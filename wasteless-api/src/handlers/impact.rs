use axum::extract::{Extension, Path, Query};
use axum::response::Json;
use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use wasteless_core::impact::{summarize, ImpactSummary};
use wasteless_core::schema::{inventory_items, users};
use wasteless_core::types::InventoryItem;
use wasteless_core::AppContext;

use crate::error::ApiError;
use crate::handlers::db_conn;

async fn load_user_items(ctx: &AppContext, user_id: i64) -> Result<Vec<InventoryItem>, ApiError> {
    let mut conn = db_conn(ctx).await?;
    let found: Option<i64> = users::table
        .find(user_id)
        .select(users::id)
        .first(&mut conn)
        .await
        .optional()?;
    if found.is_none() {
        return Err(ApiError::not_found("user", user_id));
    }

    let items = inventory_items::table
        .filter(inventory_items::user_id.eq(user_id))
        .select(InventoryItem::as_select())
        .load(&mut conn)
        .await?;
    Ok(items)
}

fn month_window(months_back: u32) -> (DateTime<Utc>, DateTime<Utc>, String) {
    let today = Utc::now().date_naive();
    let first_of_current = today.with_day(1).unwrap_or(today);
    let month_start = first_of_current - Months::new(months_back);
    let month_end = month_start + Months::new(1);

    let start = month_start.and_time(NaiveTime::MIN).and_utc();
    let end = month_end.and_time(NaiveTime::MIN).and_utc() - Duration::seconds(1);
    let label = month_start.format("%B %Y").to_string();

    (start, end, label)
}

/// GET /api/v1/impact/summary/{userId} — current calendar month.
pub async fn current_month_summary(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ImpactSummary>, ApiError> {
    let items = load_user_items(&ctx, user_id).await?;
    let (start, _, label) = month_window(0);
    Ok(Json(summarize(&items, start, Utc::now(), &label)))
}

/// GET /api/v1/impact/summary/{userId}/30days — rolling window.
pub async fn last_30_days_summary(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ImpactSummary>, ApiError> {
    let items = load_user_items(&ctx, user_id).await?;
    let now = Utc::now();
    let start = now - Duration::days(30);
    Ok(Json(summarize(&items, start, now, "Last 30 Days")))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub months: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ImpactHistoryResponse {
    pub monthly_data: Vec<ImpactSummary>,
    pub total_impact: ImpactSummary,
}

/// GET /api/v1/impact/history/{userId}?months=6 — newest month first,
/// plus one aggregate over the whole window.
pub async fn history(
    Extension(ctx): Extension<AppContext>,
    Path(user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ImpactHistoryResponse>, ApiError> {
    let months = query.months.unwrap_or(6).clamp(1, 24);
    let items = load_user_items(&ctx, user_id).await?;

    let mut monthly_data = Vec::with_capacity(months as usize);
    for i in 0..months {
        let (start, end, label) = month_window(i);
        monthly_data.push(summarize(&items, start, end, &label));
    }

    let (oldest_start, _, _) = month_window(months - 1);
    let total_label = if months == 1 {
        "Last Month".to_string()
    } else {
        format!("Last {} Months", months)
    };
    let total_impact = summarize(&items, oldest_start, Utc::now(), &total_label);

    Ok(Json(ImpactHistoryResponse {
        monthly_data,
        total_impact,
    }))
}
