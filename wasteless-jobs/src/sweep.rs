use anyhow::Result;
use chrono::Local;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing;
use wasteless_core::expiry::{record_status, reminder_date, reminder_due};
use wasteless_core::schema::{expiration_records, expiration_settings, inventory_items, users};
use wasteless_core::types::{ExpirationRecord, InventoryItem};
use wasteless_core::AppContext;
use wasteless_notify::NotificationService;

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub skipped: bool,
    pub records_seen: usize,
    pub statuses_updated: usize,
    pub reminders_sent: usize,
    pub failures: usize,
}

impl SweepReport {
    fn skipped() -> Self {
        SweepReport {
            skipped: true,
            records_seen: 0,
            statuses_updated: 0,
            reminders_sent: 0,
            failures: 0,
        }
    }
}

/// Runs the expiration sweep: recompute every record's status, then
/// fire the one-shot reminders that fall due today. Shared between the
/// daily scheduler and the manual API trigger; a try-lock guard keeps
/// two concurrent triggers from overlapping.
#[derive(Clone)]
pub struct Sweeper {
    ctx: AppContext,
    notifier: Arc<NotificationService>,
    lock: Arc<Mutex<()>>,
}

impl Sweeper {
    pub fn new(ctx: AppContext, notifier: Arc<NotificationService>) -> Self {
        Sweeper {
            ctx,
            notifier,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn run_once(&self) -> Result<SweepReport> {
        let _guard = match self.lock.try_lock() {
            Ok(g) => g,
            Err(_) => {
                tracing::warn!("Expiration sweep already running, skipping trigger");
                return Ok(SweepReport::skipped());
            }
        };

        let mut conn = self.ctx.db_pool.get().await?;

        let records: Vec<ExpirationRecord> = expiration_records::table
            .order(expiration_records::id.asc())
            .select(ExpirationRecord::as_select())
            .load(&mut conn)
            .await?;

        let today = Local::now().date_naive();
        let mut report = SweepReport {
            skipped: false,
            records_seen: records.len(),
            statuses_updated: 0,
            reminders_sent: 0,
            failures: 0,
        };

        // Each record is its own unit of work: one failure must not
        // block the rest of the batch.
        for record in records {
            match self.process_record(&record, today).await {
                Ok(outcome) => {
                    if outcome.status_updated {
                        report.statuses_updated += 1;
                    }
                    if outcome.reminder_sent {
                        report.reminders_sent += 1;
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!("Failed to process expiration record {}: {}", record.id, e);
                }
            }
        }

        tracing::info!(
            records_seen = report.records_seen,
            statuses_updated = report.statuses_updated,
            reminders_sent = report.reminders_sent,
            failures = report.failures,
            "Expiration sweep finished"
        );

        Ok(report)
    }

    async fn process_record(
        &self,
        record: &ExpirationRecord,
        today: chrono::NaiveDate,
    ) -> Result<RecordOutcome> {
        let mut conn = self.ctx.db_pool.get().await?;

        let item: Option<InventoryItem> = inventory_items::table
            .find(record.inventory_item_id)
            .select(InventoryItem::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        let item = match item {
            Some(item) => item,
            None => {
                tracing::warn!(
                    "Expiration record {} references missing inventory item {}",
                    record.id,
                    record.inventory_item_id
                );
                return Ok(RecordOutcome::default());
            }
        };

        let mut outcome = RecordOutcome::default();

        let status = record_status(today, item.expiry_date);
        let due_on = reminder_date(item.expiry_date, record.reminder_days_before);
        if record.status != status.as_str() || record.reminder_date != due_on {
            diesel::update(expiration_records::table.find(record.id))
                .set((
                    expiration_records::status.eq(status.as_str()),
                    expiration_records::reminder_date.eq(due_on),
                ))
                .execute(&mut conn)
                .await?;
            outcome.status_updated = true;
        }

        if reminder_due(record.notified, today, item.expiry_date, record.reminder_days_before) {
            let (recipient, email_enabled) = self.owner_channel(&mut conn, item.user_id).await?;
            self.notifier
                .send_expiration_reminder(&item, recipient.as_deref(), email_enabled)
                .await?;

            // Flag flips only after the send so a failed send retries
            // on the next run; a flipped flag is never resent.
            diesel::update(expiration_records::table.find(record.id))
                .set(expiration_records::notified.eq(true))
                .execute(&mut conn)
                .await?;
            outcome.reminder_sent = true;
        }

        Ok(outcome)
    }

    async fn owner_channel(
        &self,
        conn: &mut wasteless_core::db::DbConnection,
        user_id: i64,
    ) -> Result<(Option<String>, bool)> {
        let recipient: Option<String> = users::table
            .find(user_id)
            .select(users::email)
            .first(conn)
            .await
            .optional()?;

        let email_enabled: Option<bool> = expiration_settings::table
            .find(user_id)
            .select(expiration_settings::email_enabled)
            .first(conn)
            .await
            .optional()?;

        Ok((recipient, email_enabled.unwrap_or(true)))
    }
}

#[derive(Debug, Default)]
struct RecordOutcome {
    status_updated: bool,
    reminder_sent: bool,
}
