use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a tracked food unit. `consumed_at` on the item row is
/// null while the status is ACTIVE and set exactly once when the item
/// leaves ACTIVE through the status-update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Active,
    Eaten,
    Wasted,
    Donated,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "ACTIVE",
            ItemStatus::Eaten => "EATEN",
            ItemStatus::Wasted => "WASTED",
            ItemStatus::Donated => "DONATED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ItemStatus::Active),
            "EATEN" => Some(ItemStatus::Eaten),
            "WASTED" => Some(ItemStatus::Wasted),
            "DONATED" => Some(ItemStatus::Donated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::inventory_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InventoryItem {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub quantity: i32,
    pub category: Option<String>,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub storage_location: Option<String>,
    pub status: String,
    pub consumed_at: Option<DateTime<Utc>>,
    pub estimated_value: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn item_status(&self) -> Option<ItemStatus> {
        ItemStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::expiration_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExpirationSettings {
    pub user_id: i64,
    pub first_alert_days: i32,
    pub second_alert_days: i32,
    pub email_enabled: bool,
    pub push_enabled: bool,
    pub alert_on_expiry_day: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::expiration_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExpirationRecord {
    pub id: i64,
    pub inventory_item_id: i64,
    pub reminder_days_before: i32,
    pub reminder_date: NaiveDate,
    pub status: String,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::donation_centers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DonationCenter {
    pub id: i64,
    pub name: String,
    pub center_type: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub opening_hours: Option<String>,
    pub accepted_items: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
