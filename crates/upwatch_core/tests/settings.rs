use std::path::PathBuf;

use pretty_assertions::assert_eq;
use upwatch_core::{Settings, SettingsError, SourcePage, DEFAULT_TELEGRAM_API_BASE};

#[test]
fn minimal_json_fills_defaults() {
    let json = r#"{
        "discord": { "enable": true, "webhook": "https://discord.example/hook" },
        "telegram": { "enable": false }
    }"#;
    let settings: Settings = serde_json::from_str(json).unwrap();

    assert!(!settings.debug);
    assert_eq!(settings.sources.len(), 2);
    assert_eq!(
        settings.sources[0].index_url(),
        "http://book-shelf-end.com/up/index.html"
    );
    assert_eq!(settings.credentials.username, "era");
    assert_eq!(settings.cache_dir, PathBuf::from("./cache"));
    assert_eq!(settings.telegram.api_base, DEFAULT_TELEGRAM_API_BASE);
    assert_eq!(settings.fetch.request_timeout_secs, 30);
    settings.validate().unwrap();
}

#[test]
fn channel_sections_are_required() {
    let json = r#"{ "discord": { "enable": false } }"#;
    assert!(serde_json::from_str::<Settings>(json).is_err());
}

#[test]
fn enabled_discord_needs_a_webhook() {
    let mut settings = Settings::default();
    settings.discord.enable = true;
    assert_eq!(
        settings.validate(),
        Err(SettingsError::MissingDiscordWebhook)
    );
}

#[test]
fn enabled_telegram_needs_token_and_channel() {
    let mut settings = Settings::default();
    settings.telegram.enable = true;
    assert_eq!(settings.validate(), Err(SettingsError::MissingTelegramToken));

    settings.telegram.bot_token = "123:abc".to_string();
    assert_eq!(
        settings.validate(),
        Err(SettingsError::MissingTelegramChannel)
    );

    settings.telegram.channel_id = Some(-100123);
    settings.validate().unwrap();
    assert!(settings.any_channel_enabled());
}

#[test]
fn disabled_channels_need_no_credentials() {
    let settings = Settings::default();
    settings.validate().unwrap();
    assert!(!settings.any_channel_enabled());
}

#[test]
fn sources_must_be_unique_and_absolute() {
    let mut settings = Settings::default();
    settings.sources = Vec::new();
    assert_eq!(settings.validate(), Err(SettingsError::NoSources));

    settings.sources = vec![
        SourcePage::new("a", "http://example.com/up"),
        SourcePage::new("a", "http://example.com/up2"),
    ];
    assert_eq!(
        settings.validate(),
        Err(SettingsError::DuplicateLabel("a".to_string()))
    );

    settings.sources = vec![SourcePage::new("a", "example.com/up")];
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::InvalidSourceUrl { .. })
    ));

    settings.sources = vec![SourcePage::new("a", "ftp://example.com/up")];
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::InvalidSourceUrl { .. })
    ));
}

#[test]
fn trailing_slash_is_ignored_in_index_url() {
    let page = SourcePage::new("x", "http://example.com/up/");
    assert_eq!(page.index_url(), "http://example.com/up/index.html");
}
