use reqwest::StatusCode;
use serde::Serialize;
use upwatch_core::{Credentials, DiscordSettings, UploadRecord};
use upwatch_logging::{watch_error, watch_info};
use url::Url;

use super::DeliveryReport;
use crate::{ChannelOverflowError, DispatchError, MAX_EMBEDS_PER_MESSAGE};

// Discord's per-embed limits, in characters.
const TITLE_LIMIT: usize = 256;
const DESCRIPTION_LIMIT: usize = 4096;
const FIELD_VALUE_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub footer: EmbedFooter,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Chat webhook channel: the whole batch goes out as one message.
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    client: reqwest::Client,
    endpoint: Url,
    avatar_url: Option<String>,
    credentials: Credentials,
}

impl DiscordNotifier {
    /// `credentials` are quoted next to each download link; the files sit
    /// behind the same basic auth as the listing.
    pub fn new(
        client: reqwest::Client,
        settings: &DiscordSettings,
        credentials: &Credentials,
    ) -> Result<Self, DispatchError> {
        let mut endpoint =
            Url::parse(settings.webhook.trim()).map_err(|err| DispatchError::InvalidEndpoint {
                endpoint: settings.webhook.clone(),
                reason: err.to_string(),
            })?;
        if let Some(thread_id) = settings.thread_id.as_deref().filter(|id| !id.is_empty()) {
            endpoint.query_pairs_mut().append_pair("thread_id", thread_id);
        }
        Ok(Self {
            client,
            endpoint,
            avatar_url: settings.avatar_url.clone().filter(|url| !url.is_empty()),
            credentials: credentials.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the message for `records`. More than
    /// [`MAX_EMBEDS_PER_MESSAGE`] records is refused rather than split.
    pub fn build_payload(
        &self,
        records: &[UploadRecord],
        provider_label: &str,
    ) -> Result<WebhookPayload, ChannelOverflowError> {
        if records.len() > MAX_EMBEDS_PER_MESSAGE {
            return Err(ChannelOverflowError {
                count: records.len(),
                limit: MAX_EMBEDS_PER_MESSAGE,
            });
        }
        Ok(WebhookPayload {
            embeds: records
                .iter()
                .map(|record| embed_for(record, &self.credentials))
                .collect(),
            username: Some(provider_label.to_string()).filter(|label| !label.is_empty()),
            avatar_url: self.avatar_url.clone(),
        })
    }

    pub async fn send(
        &self,
        records: &[UploadRecord],
        provider_label: &str,
    ) -> Result<DeliveryReport, ChannelOverflowError> {
        let payload = self.build_payload(records, provider_label)?;
        if payload.embeds.is_empty() {
            return Ok(DeliveryReport::default());
        }

        match self.post(&payload).await {
            Ok(()) => {
                watch_info!(
                    "Sent {} record(s) to Discord for {}",
                    payload.embeds.len(),
                    provider_label
                );
                Ok(DeliveryReport { sent: 1, failed: 0 })
            }
            Err(err) => {
                watch_error!("Sending to Discord failed for {}: {}", provider_label, err);
                Ok(DeliveryReport { sent: 0, failed: 1 })
            }
        }
    }

    async fn post(&self, payload: &WebhookPayload) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|err| DispatchError::Transport(err.without_url()))?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DispatchError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn embed_for(record: &UploadRecord, credentials: &Credentials) -> Embed {
    let description = format!(
        "[Download]({}) (user `{}`, password `{}`)\n`{}` _{}_",
        record.source_url(),
        credentials.username,
        credentials.password,
        record.file_id(),
        record.size_label()
    );
    Embed {
        title: clip(record.file_name(), TITLE_LIMIT),
        description: clip(&description, DESCRIPTION_LIMIT),
        footer: EmbedFooter {
            text: format!("Updated {}", record.published_at()),
        },
        fields: vec![EmbedField {
            name: "Notes".to_string(),
            value: clip(record.description(), FIELD_VALUE_LIMIT),
        }],
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars - 1).collect();
    clipped.push('…');
    clipped
}
