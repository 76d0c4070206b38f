//! Upwatch engine: fetching, listing parsing, detection and notification.
mod cache;
mod decode;
mod detect;
mod fetch;
mod listing;
mod notify;
mod orchestrator;
mod types;

pub use cache::{cache_key, ensure_cache_dir, CacheError, PageCache};
pub use decode::{decode_page, DecodedPage};
pub use detect::{select_recent, UpdateDetector};
pub use fetch::{FetchSettings, PageFetcher, ReqwestFetcher};
pub use listing::TableParser;
pub use notify::{
    format_message, BroadcastReport, DeliveryReport, DiscordNotifier, Dispatcher, Embed,
    EmbedField, EmbedFooter, TelegramNotifier, WebhookPayload,
};
pub use orchestrator::{Orchestrator, PageOutcome, PageReport, RunMode, RunSummary};
pub use types::{
    ChannelOverflowError, DetectError, DispatchError, FailureKind, FetchError, ParseError,
    RunError, MAX_EMBEDS_PER_MESSAGE,
};
