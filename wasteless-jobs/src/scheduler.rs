use anyhow::Result;
use chrono::{Days, Local, NaiveTime};
use std::time::Duration;
use tracing;

use crate::sweep::Sweeper;

/// Daily scheduler: sleeps until the configured local hour, runs the
/// expiration sweep, repeats. Errors are logged and the loop keeps
/// going; the sweep's own try-lock guard protects against a manual
/// trigger overlapping the scheduled one.
pub async fn run(sweeper: Sweeper, daily_run_hour: u32) -> Result<()> {
    let run_at = NaiveTime::from_hms_opt(daily_run_hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);

    tracing::info!("Daily expiration sweep scheduled at {} local time", run_at);

    loop {
        let wait = duration_until_next(run_at);
        tracing::debug!("Next expiration sweep in {:?}", wait);
        tokio::time::sleep(wait).await;

        match sweeper.run_once().await {
            Ok(report) if report.skipped => {
                tracing::warn!("Scheduled sweep skipped, a sweep was already in flight");
            }
            Ok(report) => {
                tracing::info!(
                    reminders_sent = report.reminders_sent,
                    "Scheduled expiration sweep completed"
                );
            }
            Err(e) => {
                tracing::error!("Scheduled expiration sweep failed: {}", e);
            }
        }
    }
}

fn duration_until_next(run_at: NaiveTime) -> Duration {
    let now = Local::now();
    let today_run = now.date_naive().and_time(run_at);
    let next = if now.naive_local() < today_run {
        today_run
    } else {
        now.date_naive()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(run_at))
            .unwrap_or(today_run)
    };

    (next - now.naive_local()).to_std().unwrap_or(Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_until_next_is_within_a_day() {
        let run_at = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let wait = duration_until_next(run_at);
        assert!(wait <= Duration::from_secs(24 * 60 * 60));
    }
}
