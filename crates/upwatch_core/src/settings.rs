use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("discord is enabled but no webhook is configured")]
    MissingDiscordWebhook,
    #[error("telegram is enabled but no bot_token is configured")]
    MissingTelegramToken,
    #[error("telegram is enabled but no channel_id is configured")]
    MissingTelegramChannel,
    #[error("no source pages are configured")]
    NoSources,
    #[error("source label {0:?} is used more than once")]
    DuplicateLabel(String),
    #[error("source {url:?} is not an absolute http(s) url: {reason}")]
    InvalidSourceUrl { url: String, reason: String },
}

/// Everything a run needs, constructed once at startup and passed down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Dry run: detect and log, but never send.
    #[serde(default)]
    pub debug: bool,
    pub discord: DiscordSettings,
    pub telegram: TelegramSettings,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourcePage>,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub fetch: FetchLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            discord: DiscordSettings::default(),
            telegram: TelegramSettings::default(),
            sources: default_sources(),
            credentials: Credentials::default(),
            cache_dir: default_cache_dir(),
            fetch: FetchLimits::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.discord.enable && self.discord.webhook.trim().is_empty() {
            return Err(SettingsError::MissingDiscordWebhook);
        }
        if self.telegram.enable {
            if self.telegram.bot_token.trim().is_empty() {
                return Err(SettingsError::MissingTelegramToken);
            }
            if self.telegram.channel_id.is_none() {
                return Err(SettingsError::MissingTelegramChannel);
            }
        }

        if self.sources.is_empty() {
            return Err(SettingsError::NoSources);
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.label.as_str()) {
                return Err(SettingsError::DuplicateLabel(source.label.clone()));
            }
            source.check_url()?;
        }
        Ok(())
    }

    pub fn any_channel_enabled(&self) -> bool {
        self.discord.enable || self.telegram.enable
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordSettings {
    pub enable: bool,
    #[serde(default)]
    pub webhook: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramSettings {
    pub enable: bool,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub channel_id: Option<i64>,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            enable: false,
            bot_token: String::new(),
            channel_id: None,
            api_base: default_telegram_api_base(),
        }
    }
}

/// A listing page and the label its notifications are sent under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePage {
    pub label: String,
    pub base_url: String,
}

impl SourcePage {
    pub fn new(label: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            base_url: base_url.into(),
        }
    }

    /// Base url without any trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn index_url(&self) -> String {
        format!("{}/index.html", self.base())
    }

    fn check_url(&self) -> Result<(), SettingsError> {
        let invalid = |reason: String| SettingsError::InvalidSourceUrl {
            url: self.base_url.clone(),
            reason,
        };
        let parsed = url::Url::parse(self.base()).map_err(|err| invalid(err.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(invalid(format!("unsupported scheme {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "era".to_string(),
            password: "era".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchLimits {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_bytes: u64,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

fn default_sources() -> Vec<SourcePage> {
    vec![
        SourcePage::new("其他era游戏", "http://book-shelf-end.com/up"),
        SourcePage::new("东方era游戏", "http://book-shelf-end.com/up2"),
    ]
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_telegram_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}
