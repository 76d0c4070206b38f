use reqwest::StatusCode;
use serde::Serialize;
use upwatch_core::{Credentials, TelegramSettings, UploadRecord};
use upwatch_logging::{watch_error, watch_info};
use url::Url;

use super::DeliveryReport;
use crate::DispatchError;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Bot channel: one message per record.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: Url,
    chat_id: i64,
    credentials: Credentials,
}

impl TelegramNotifier {
    pub fn new(
        client: reqwest::Client,
        settings: &TelegramSettings,
        credentials: &Credentials,
    ) -> Result<Self, DispatchError> {
        let chat_id = settings
            .channel_id
            .ok_or_else(|| DispatchError::InvalidEndpoint {
                endpoint: settings.api_base.clone(),
                reason: "no channel_id".to_string(),
            })?;
        let raw = format!(
            "{}/bot{}/sendMessage",
            settings.api_base.trim_end_matches('/'),
            settings.bot_token.trim()
        );
        // The token is part of the path; keep it out of error messages.
        let endpoint = Url::parse(&raw).map_err(|err| DispatchError::InvalidEndpoint {
            endpoint: settings.api_base.clone(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            client,
            endpoint,
            chat_id,
            credentials: credentials.clone(),
        })
    }

    /// Attempts every record; a failed record is logged and skipped.
    pub async fn send(&self, records: &[UploadRecord], provider_label: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for record in records {
            let text = format_message(record, provider_label, &self.credentials);
            match self.post(&text).await {
                Ok(()) => {
                    watch_info!("Sent {} to Telegram", record.file_id());
                    report.sent += 1;
                }
                Err(err) => {
                    watch_error!("Sending {} to Telegram failed: {}", record.file_id(), err);
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn post(&self, text: &str) -> Result<(), DispatchError> {
        let message = SendMessage {
            chat_id: self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&message)
            .send()
            .await
            .map_err(|err| DispatchError::Transport(err.without_url()))?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DispatchError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// HTML message body for one record, with the login the download link needs.
pub fn format_message(
    record: &UploadRecord,
    provider_label: &str,
    credentials: &Credentials,
) -> String {
    format!(
        "<b>[{label}]</b> {name}\n\
         <i>Updated {time}</i>\n\
         <a href=\"{url}\">Download</a> (user <code>{user}</code>, password <code>{password}</code>)\n\
         <code>{id}</code> {size}\n\
         {desc}",
        label = escape_html(provider_label),
        name = escape_html(record.file_name()),
        time = escape_html(record.published_at()),
        url = escape_html(record.source_url()),
        user = escape_html(&credentials.username),
        password = escape_html(&credentials.password),
        id = escape_html(record.file_id()),
        size = escape_html(record.size_label()),
        desc = escape_html(record.description()),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_html;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"a" & b</b>"#),
            "&lt;b&gt;&quot;a&quot; &amp; b&lt;/b&gt;"
        );
    }
}
