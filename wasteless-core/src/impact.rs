use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{InventoryItem, ItemStatus};

/// Approximate CO2 equivalent per kilogram of food waste, in kg.
pub const CO2_PER_KG_FOOD: f64 = 2.5;

/// Assumed average weight of one inventory item, in kg.
pub const AVG_WEIGHT_PER_ITEM_KG: f64 = 0.5;

/// Fallback monetary value for items with no user-supplied estimate.
pub const DEFAULT_ITEM_VALUE: f64 = 500.0;

#[derive(Debug, Clone, Serialize)]
pub struct ImpactSummary {
    pub money_saved: f64,
    pub money_wasted: f64,
    pub net_impact: f64,
    pub co2_saved_kg: f64,
    pub co2_wasted_kg: f64,
    pub items_saved: i64,
    pub items_wasted: i64,
    pub items_active: i64,
    pub total_items: i64,
    pub waste_reduction_percentage: f64,
    pub period: String,
}

/// Aggregate one user's impact over a consumption window. `items` is
/// the user's full inventory; only items consumed inside
/// `[start, end]` count toward the period, while the active count is
/// a point-in-time figure independent of the window.
pub fn summarize(
    items: &[InventoryItem],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    period: &str,
) -> ImpactSummary {
    let consumed: Vec<&InventoryItem> = items
        .iter()
        .filter(|item| match item.consumed_at {
            Some(at) => at >= start && at <= end,
            None => false,
        })
        .collect();

    let eaten: Vec<&InventoryItem> = consumed
        .iter()
        .copied()
        .filter(|item| item.item_status() == Some(ItemStatus::Eaten))
        .collect();
    let wasted: Vec<&InventoryItem> = consumed
        .iter()
        .copied()
        .filter(|item| item.item_status() == Some(ItemStatus::Wasted))
        .collect();

    let items_active = items
        .iter()
        .filter(|item| item.item_status() == Some(ItemStatus::Active))
        .count() as i64;

    let money_saved = total_value(&eaten);
    let money_wasted = total_value(&wasted);
    let net_impact = round2(money_saved - money_wasted);

    let co2_saved_kg = co2_impact(&eaten);
    let co2_wasted_kg = co2_impact(&wasted);

    let items_saved = eaten.len() as i64;
    let items_wasted = wasted.len() as i64;
    let total_items = consumed.len() as i64;

    let waste_reduction_percentage = if total_items > 0 {
        round1(items_saved as f64 * 100.0 / total_items as f64)
    } else {
        0.0
    };

    ImpactSummary {
        money_saved,
        money_wasted,
        net_impact,
        co2_saved_kg,
        co2_wasted_kg,
        items_saved,
        items_wasted,
        items_active,
        total_items,
        waste_reduction_percentage,
        period: period.to_string(),
    }
}

fn total_value(items: &[&InventoryItem]) -> f64 {
    items
        .iter()
        .map(|item| item.estimated_value.unwrap_or(DEFAULT_ITEM_VALUE) * f64::from(item.quantity))
        .sum()
}

fn co2_impact(items: &[&InventoryItem]) -> f64 {
    let total_weight: f64 = items
        .iter()
        .map(|item| f64::from(item.quantity) * AVG_WEIGHT_PER_ITEM_KG)
        .sum();
    total_weight * CO2_PER_KG_FOOD
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn item(status: &str, quantity: i32, value: Option<f64>, consumed_day: Option<u32>) -> InventoryItem {
        InventoryItem {
            id: 1,
            user_id: 1,
            name: "Milk".to_string(),
            quantity,
            category: Some("Dairy".to_string()),
            purchase_date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2025, 11, 20).unwrap(),
            storage_location: Some("Fridge".to_string()),
            status: status.to_string(),
            consumed_at: consumed_day.map(|d| Utc.with_ymd_and_hms(2025, 11, d, 12, 0, 0).unwrap()),
            estimated_value: value,
            created_at: Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
        }
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 11, 30, 23, 59, 59).unwrap(),
        )
    }

    #[test]
    fn test_summary_values_and_percentage() {
        let items = vec![
            item("EATEN", 2, Some(300.0), Some(5)),
            item("WASTED", 1, None, Some(6)),
            item("ACTIVE", 1, Some(100.0), None),
        ];
        let (start, end) = window();
        let summary = summarize(&items, start, end, "November 2025");

        assert_eq!(summary.money_saved, 600.0);
        assert_eq!(summary.money_wasted, 500.0);
        assert_eq!(summary.net_impact, 100.0);
        // 2 items eaten at 0.5 kg each, 2.5 kg CO2 per kg
        assert_eq!(summary.co2_saved_kg, 2.5);
        assert_eq!(summary.co2_wasted_kg, 1.25);
        assert_eq!(summary.items_saved, 1);
        assert_eq!(summary.items_wasted, 1);
        assert_eq!(summary.items_active, 1);
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.waste_reduction_percentage, 50.0);
        assert_eq!(summary.period, "November 2025");
    }

    #[test]
    fn test_summary_empty_period() {
        let items = vec![item("ACTIVE", 3, None, None)];
        let (start, end) = window();
        let summary = summarize(&items, start, end, "Last 30 Days");

        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.waste_reduction_percentage, 0.0);
        assert_eq!(summary.items_active, 1);
    }

    #[test]
    fn test_summary_excludes_out_of_window_consumption() {
        let items = vec![item("EATEN", 1, Some(200.0), Some(5))];
        let start = Utc.with_ymd_and_hms(2025, 11, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 11, 30, 0, 0, 0).unwrap();
        let summary = summarize(&items, start, end, "window");

        assert_eq!(summary.items_saved, 0);
        assert_eq!(summary.money_saved, 0.0);
    }
}
