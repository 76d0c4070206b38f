mod common;

use common::{init_logging, records};
use pretty_assertions::assert_eq;
use serde_json::Value;
use upwatch_core::{Credentials, DiscordSettings, TelegramSettings};
use upwatch_engine::{
    format_message, ChannelOverflowError, DeliveryReport, DiscordNotifier, Dispatcher,
    TelegramNotifier,
};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn discord(server: &MockServer) -> DiscordNotifier {
    let settings = DiscordSettings {
        enable: true,
        webhook: format!("{}/api/webhooks/1/abc", server.uri()),
        thread_id: None,
        avatar_url: None,
    };
    DiscordNotifier::new(reqwest::Client::new(), &settings, &Credentials::default()).unwrap()
}

fn telegram(server: &MockServer) -> TelegramNotifier {
    let settings = TelegramSettings {
        enable: true,
        bot_token: "123:abc".to_string(),
        channel_id: Some(-1001),
        api_base: server.uri(),
    };
    TelegramNotifier::new(reqwest::Client::new(), &settings, &Credentials::default()).unwrap()
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn ten_records_go_out_as_one_message() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let report = discord(&server).send(&records(10), "东方era游戏").await.unwrap();
    assert_eq!(report, DeliveryReport { sent: 1, failed: 0 });

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["embeds"].as_array().unwrap().len(), 10);
    assert_eq!(body["username"], "东方era游戏");
    assert!(body.get("avatar_url").is_none());

    let embed = &body["embeds"][0];
    assert_eq!(embed["title"], "era0000_game.zip");
    assert_eq!(
        embed["description"],
        "[Download](http://example.com/up/src/era0000.zip) (user `era`, password `era`)\n\
         `era0000` _1.2MB_"
    );
    assert_eq!(embed["footer"]["text"], "Updated 2023-06-23 14:10:00");
    assert_eq!(embed["fields"][0]["value"], "notes for era0000");
}

#[tokio::test]
async fn eleven_records_overflow_without_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = discord(&server).send(&records(11), "label").await.unwrap_err();
    assert_eq!(err, ChannelOverflowError { count: 11, limit: 10 });
}

#[tokio::test]
async fn rejected_webhook_is_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad embed"))
        .expect(1)
        .mount(&server)
        .await;

    let report = discord(&server).send(&records(2), "label").await.unwrap();
    assert_eq!(report, DeliveryReport { sent: 0, failed: 1 });
}

#[tokio::test]
async fn ok_instead_of_no_content_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let report = discord(&server).send(&records(1), "label").await.unwrap();
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn thread_id_and_avatar_are_applied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(query_param("thread_id", "42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let settings = DiscordSettings {
        enable: true,
        webhook: format!("{}/hook", server.uri()),
        thread_id: Some("42".to_string()),
        avatar_url: Some("https://example.com/a.png".to_string()),
    };
    let notifier =
        DiscordNotifier::new(reqwest::Client::new(), &settings, &Credentials::default()).unwrap();
    let report = notifier.send(&records(1), "label").await.unwrap();
    assert_eq!(report.sent, 1);

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["avatar_url"], "https://example.com/a.png");
}

#[tokio::test]
async fn bot_channel_sends_one_message_per_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
        .expect(3)
        .mount(&server)
        .await;

    let report = telegram(&server).send(&records(3), "label").await;
    assert_eq!(report, DeliveryReport { sent: 3, failed: 0 });

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["chat_id"], -1001);
    assert_eq!(bodies[0]["parse_mode"], "HTML");
    assert_eq!(bodies[0]["disable_web_page_preview"], true);
    assert!(bodies[2]["text"].as_str().unwrap().contains("era0002_game.zip"));
}

#[tokio::test]
async fn one_failed_bot_message_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("era0001"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let report = telegram(&server).send(&records(3), "label").await;
    assert_eq!(report, DeliveryReport { sent: 2, failed: 1 });
}

#[test]
fn bot_message_escapes_html() {
    let mut fields = upwatch_core::RecordFields {
        source_url: "http://example.com/up/src/a.zip".to_string(),
        file_id: "era0009".to_string(),
        file_name: "<script>.zip".to_string(),
        size_label: "3KB".to_string(),
        published_at: "2023-06-23 14:10:00".to_string(),
        description: "fix & update".to_string(),
    };
    let credentials = Credentials {
        username: "guest".to_string(),
        password: "a<b".to_string(),
    };
    let text = format_message(
        &upwatch_core::UploadRecord::new(fields.clone()).unwrap(),
        "东方",
        &credentials,
    );
    assert_eq!(
        text,
        "<b>[东方]</b> &lt;script&gt;.zip\n\
         <i>Updated 2023-06-23 14:10:00</i>\n\
         <a href=\"http://example.com/up/src/a.zip\">Download</a> \
         (user <code>guest</code>, password <code>a&lt;b</code>)\n\
         <code>era0009</code> 3KB\n\
         fix &amp; update"
    );

    fields.description = "plain".to_string();
    let text = format_message(
        &upwatch_core::UploadRecord::new(fields).unwrap(),
        "x",
        &Credentials::default(),
    );
    assert!(text.contains("(user <code>era</code>, password <code>era</code>)"));
    assert!(text.ends_with("\nplain"));
}

#[tokio::test]
async fn empty_broadcast_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(Some(discord(&server)), Some(telegram(&server)), false);
    let report = dispatcher.broadcast(&[], "label").await.unwrap();
    assert_eq!(report.discord, None);
    assert_eq!(report.telegram, None);
}

#[tokio::test]
async fn dry_run_suppresses_every_channel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(Some(discord(&server)), Some(telegram(&server)), true);
    let report = dispatcher.broadcast(&records(2), "label").await.unwrap();
    assert!(report.suppressed);
}

#[tokio::test]
async fn broadcast_reaches_both_channels_independently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/abc"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(Some(discord(&server)), Some(telegram(&server)), false);
    let report = dispatcher.broadcast(&records(2), "label").await.unwrap();
    assert_eq!(report.discord, Some(DeliveryReport { sent: 0, failed: 1 }));
    assert_eq!(report.telegram, Some(DeliveryReport { sent: 2, failed: 0 }));
}

#[tokio::test]
async fn overflow_stops_broadcast_before_any_channel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(Some(discord(&server)), Some(telegram(&server)), false);
    let err = dispatcher.broadcast(&records(11), "label").await.unwrap_err();
    assert_eq!(err.count, 11);
}

#[tokio::test]
async fn bot_only_dispatch_has_no_embed_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(12)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(None, Some(telegram(&server)), false);
    let report = dispatcher.broadcast(&records(12), "label").await.unwrap();
    assert_eq!(report.telegram, Some(DeliveryReport { sent: 12, failed: 0 }));
}

#[test]
fn invalid_webhook_is_rejected_at_setup() {
    let settings = DiscordSettings {
        enable: true,
        webhook: "not a url".to_string(),
        thread_id: None,
        avatar_url: None,
    };
    assert!(
        DiscordNotifier::new(reqwest::Client::new(), &settings, &Credentials::default()).is_err()
    );
}
