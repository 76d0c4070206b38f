//! Fan-out of new records to the enabled notification channels.
mod discord;
mod telegram;

use std::time::Duration;

use upwatch_core::{Settings, UploadRecord};
use upwatch_logging::{watch_info, watch_warn};

use crate::{ChannelOverflowError, DispatchError};

pub use discord::{DiscordNotifier, Embed, EmbedField, EmbedFooter, WebhookPayload};
pub use telegram::{format_message, TelegramNotifier};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Messages sent and failed on one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub discord: Option<DeliveryReport>,
    pub telegram: Option<DeliveryReport>,
    /// Sends were skipped because of dry-run mode.
    pub suppressed: bool,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    discord: Option<DiscordNotifier>,
    telegram: Option<TelegramNotifier>,
    dry_run: bool,
}

impl Dispatcher {
    pub fn new(
        discord: Option<DiscordNotifier>,
        telegram: Option<TelegramNotifier>,
        dry_run: bool,
    ) -> Self {
        Self {
            discord,
            telegram,
            dry_run,
        }
    }

    /// Builds a notifier for every enabled channel.
    pub fn from_settings(settings: &Settings) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()?;
        let discord = settings
            .discord
            .enable
            .then(|| {
                DiscordNotifier::new(client.clone(), &settings.discord, &settings.credentials)
            })
            .transpose()?;
        let telegram = settings
            .telegram
            .enable
            .then(|| {
                TelegramNotifier::new(client.clone(), &settings.telegram, &settings.credentials)
            })
            .transpose()?;
        Ok(Self::new(discord, telegram, settings.debug))
    }

    /// Logs the batch and sends it to each enabled channel.
    ///
    /// Delivery failures are logged and reported, never returned. Only a
    /// batch too large for the chat webhook is an error, and it is raised
    /// before any channel is contacted.
    pub async fn broadcast(
        &self,
        records: &[UploadRecord],
        provider_label: &str,
    ) -> Result<BroadcastReport, ChannelOverflowError> {
        if records.is_empty() {
            watch_info!("{}: no updates", provider_label);
            return Ok(BroadcastReport::default());
        }

        watch_info!("{}: {} recent update(s)", provider_label, records.len());
        for record in records {
            watch_info!("  {} {}", record.file_id(), record.source_url());
            watch_info!(
                "    {} ({}) updated {}",
                record.file_name(),
                record.size_label(),
                record.published_at()
            );
            watch_info!("    {}", record.description());
        }

        if self.dry_run {
            watch_warn!("Dry run: not sending {} update(s)", records.len());
            return Ok(BroadcastReport {
                suppressed: true,
                ..BroadcastReport::default()
            });
        }

        if let Some(discord) = &self.discord {
            discord.build_payload(records, provider_label)?;
        }

        let mut report = BroadcastReport::default();
        if let Some(discord) = &self.discord {
            report.discord = Some(discord.send(records, provider_label).await?);
        }
        if let Some(telegram) = &self.telegram {
            report.telegram = Some(telegram.send(records, provider_label).await);
        }
        Ok(report)
    }
}
