//! Upwatch core: pure domain types, timestamp handling and settings.
mod record;
mod settings;
mod time;

pub use record::{EmptyFieldError, RecordFields, UploadRecord};
pub use settings::{
    Credentials, DiscordSettings, FetchLimits, Settings, SettingsError, SourcePage,
    TelegramSettings, DEFAULT_TELEGRAM_API_BASE,
};
pub use time::{
    weekday_for_glyph, Clock, FixedClock, FormatError, SystemClock, TimeConverter, WindowPolicy,
    NORMALIZED_FORMAT, SOURCE_ZONE, TARGET_ZONE,
};
