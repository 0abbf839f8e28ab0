use anyhow::Result;
use std::sync::Arc;
use tracing;
use wasteless_core::config::NotifyConfig;
use wasteless_core::types::InventoryItem;

use crate::email::EmailDelivery;

/// Out-of-band reminder sender. Fire-and-forget from the caller's
/// perspective: one blocking attempt per channel, no retry.
pub struct NotificationService {
    email: Arc<EmailDelivery>,
}

impl NotificationService {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        Ok(Self {
            email: Arc::new(EmailDelivery::new(config)?),
        })
    }

    /// Send the expiry reminder for one inventory item. `recipient` is
    /// the owner's email; when email is not configured or the owner
    /// has the channel disabled, the reminder is logged only.
    pub async fn send_expiration_reminder(
        &self,
        item: &InventoryItem,
        recipient: Option<&str>,
        email_enabled: bool,
    ) -> Result<()> {
        tracing::info!("Sending expiry reminder for inventory item {}", item.id);

        let subject = "Food expiring soon".to_string();
        let body = format!(
            "{} (x{}) expires on {}. Use it, freeze it, or donate it before it goes to waste.",
            item.name, item.quantity, item.expiry_date
        );

        match recipient {
            Some(address) if email_enabled && self.email.is_configured() => {
                self.email.send(address, &subject, &body).await?;
            }
            _ => {
                tracing::info!(
                    item_id = item.id,
                    expiry_date = %item.expiry_date,
                    "Reminder recorded without email delivery"
                );
            }
        }

        Ok(())
    }
}
