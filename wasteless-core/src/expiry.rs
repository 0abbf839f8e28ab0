use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Four-tier urgency used by the upcoming-expirations view. Boundaries
/// belong to the more urgent tier, and already-expired items (negative
/// days) are CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Critical,
    High,
    Medium,
    Low,
}

/// Coarser three-tier classification carried by expiration records.
/// This scheme and [`UrgencyLevel`] evolved separately and are exposed
/// by different endpoints; they are deliberately not unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpirationStatus {
    Fresh,
    ExpiringSoon,
    Expired,
}

impl ExpirationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationStatus::Fresh => "FRESH",
            ExpirationStatus::ExpiringSoon => "EXPIRING_SOON",
            ExpirationStatus::Expired => "EXPIRED",
        }
    }
}

/// Signed whole days until expiry. Negative once the item is past its
/// expiry date.
pub fn days_until_expiry(today: NaiveDate, expiry: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

pub fn urgency_for(days_until_expiry: i64) -> UrgencyLevel {
    if days_until_expiry <= 1 {
        UrgencyLevel::Critical
    } else if days_until_expiry <= 3 {
        UrgencyLevel::High
    } else if days_until_expiry <= 7 {
        UrgencyLevel::Medium
    } else {
        UrgencyLevel::Low
    }
}

pub fn record_status(today: NaiveDate, expiry: NaiveDate) -> ExpirationStatus {
    if today > expiry {
        return ExpirationStatus::Expired;
    }
    let soon_from = expiry - Days::new(3);
    if today >= soon_from {
        return ExpirationStatus::ExpiringSoon;
    }
    ExpirationStatus::Fresh
}

/// Per-user alert thresholds, an exact-day match rather than a range:
/// an item is flagged only on the configured day(s), not on every day
/// leading up to expiry.
#[derive(Debug, Clone, Copy)]
pub struct AlertThresholds {
    pub first_alert_days: i32,
    pub second_alert_days: i32,
    pub alert_on_expiry_day: bool,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertThresholds {
            first_alert_days: 3,
            second_alert_days: 1,
            alert_on_expiry_day: true,
        }
    }
}

pub fn alert_due(thresholds: &AlertThresholds, days_until_expiry: i64) -> bool {
    days_until_expiry == i64::from(thresholds.first_alert_days)
        || days_until_expiry == i64::from(thresholds.second_alert_days)
        || (days_until_expiry == 0 && thresholds.alert_on_expiry_day)
}

/// Date on which a record's one-shot reminder falls due.
pub fn reminder_date(expiry: NaiveDate, reminder_days_before: i32) -> NaiveDate {
    expiry - Days::new(reminder_days_before.max(0) as u64)
}

/// A reminder is sent at most once: the `notified` flag guards repeat
/// runs of the daily sweep on the same day.
pub fn reminder_due(notified: bool, today: NaiveDate, expiry: NaiveDate, reminder_days_before: i32) -> bool {
    !notified && today == reminder_date(expiry, reminder_days_before)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_until_expiry() {
        let today = date(2025, 11, 10);
        assert_eq!(days_until_expiry(today, date(2025, 11, 11)), 1);
        assert_eq!(days_until_expiry(today, date(2025, 11, 10)), 0);
        assert_eq!(days_until_expiry(today, date(2025, 11, 9)), -1);
    }

    #[test]
    fn test_urgency_boundaries() {
        assert_eq!(urgency_for(1), UrgencyLevel::Critical);
        assert_eq!(urgency_for(0), UrgencyLevel::Critical);
        assert_eq!(urgency_for(-1), UrgencyLevel::Critical);
        assert_eq!(urgency_for(2), UrgencyLevel::High);
        assert_eq!(urgency_for(3), UrgencyLevel::High);
        assert_eq!(urgency_for(4), UrgencyLevel::Medium);
        assert_eq!(urgency_for(7), UrgencyLevel::Medium);
        assert_eq!(urgency_for(8), UrgencyLevel::Low);
    }

    #[test]
    fn test_record_status_three_tiers() {
        let expiry = date(2025, 11, 10);
        assert_eq!(record_status(date(2025, 11, 11), expiry), ExpirationStatus::Expired);
        assert_eq!(record_status(date(2025, 11, 10), expiry), ExpirationStatus::ExpiringSoon);
        assert_eq!(record_status(date(2025, 11, 7), expiry), ExpirationStatus::ExpiringSoon);
        assert_eq!(record_status(date(2025, 11, 6), expiry), ExpirationStatus::Fresh);
    }

    #[test]
    fn test_alert_due_default_settings() {
        let defaults = AlertThresholds::default();
        assert!(alert_due(&defaults, 3));
        assert!(!alert_due(&defaults, 2));
        assert!(alert_due(&defaults, 1));
        assert!(alert_due(&defaults, 0));
        assert!(!alert_due(&defaults, 4));
    }

    #[test]
    fn test_alert_on_expiry_day_flag_off() {
        let thresholds = AlertThresholds {
            alert_on_expiry_day: false,
            ..AlertThresholds::default()
        };
        assert!(!alert_due(&thresholds, 0));
        assert!(alert_due(&thresholds, 1));
    }

    #[test]
    fn test_reminder_due_once() {
        let expiry = date(2025, 11, 10);
        let today = date(2025, 11, 8);
        assert!(reminder_due(false, today, expiry, 2));
        // once sent, the same day no longer fires
        assert!(!reminder_due(true, today, expiry, 2));
        // and other days never fire
        assert!(!reminder_due(false, date(2025, 11, 7), expiry, 2));
    }

    #[test]
    fn test_reminder_date() {
        assert_eq!(reminder_date(date(2025, 11, 10), 3), date(2025, 11, 7));
        assert_eq!(reminder_date(date(2025, 11, 10), 0), date(2025, 11, 10));
    }
}
