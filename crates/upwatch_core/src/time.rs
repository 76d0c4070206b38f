//! Timestamp normalization and the "is this new" windows.
//!
//! The listing site renders times in Japan local time as
//! `YY/MM/DD<glyph>HH:mm:ss`, where the glyph is one of the parenthesized
//! ideographs ㈪..㈰ naming the weekday. Everything downstream works on the
//! normalized form: target zone, [`NORMALIZED_FORMAT`].

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

pub const SOURCE_ZONE: Tz = chrono_tz::Asia::Tokyo;
pub const TARGET_ZONE: Tz = chrono_tz::Asia::Shanghai;
pub const NORMALIZED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Applied after the glyph has been replaced by its English weekday name.
const SOURCE_FORMAT: &str = "%y/%m/%d %A %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("no recognized weekday glyph in {input:?}")]
    UnknownWeekday { input: String },
    #[error("timestamp {input:?} does not match `{pattern}`: {reason}")]
    Pattern {
        input: String,
        pattern: &'static str,
        reason: String,
    },
    #[error("local time {input:?} does not map to a single instant in {zone}")]
    AmbiguousLocalTime { input: String, zone: String },
}

/// Source of "now". Injected so window decisions are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Which window decides whether a record counts as new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPolicy {
    /// Production: published during the current clock hour.
    #[default]
    LastHour,
    /// Manual verification runs only.
    LastWeek,
}

/// Maps a weekday glyph (㈪ Monday through ㈰ Sunday) to its weekday.
pub fn weekday_for_glyph(glyph: char) -> Option<Weekday> {
    match glyph {
        '㈪' => Some(Weekday::Mon),
        '㈫' => Some(Weekday::Tue),
        '㈬' => Some(Weekday::Wed),
        '㈭' => Some(Weekday::Thu),
        '㈮' => Some(Weekday::Fri),
        '㈯' => Some(Weekday::Sat),
        '㈰' => Some(Weekday::Sun),
        _ => None,
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Clone)]
pub struct TimeConverter {
    source: Tz,
    target: Tz,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TimeConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeConverter")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Default for TimeConverter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl TimeConverter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_zones(SOURCE_ZONE, TARGET_ZONE, clock)
    }

    pub fn with_zones(source: Tz, target: Tz, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            target,
            clock,
        }
    }

    /// Converts a raw listing timestamp into the target zone, formatted with
    /// [`NORMALIZED_FORMAT`].
    ///
    /// The glyph is swapped for its weekday name before parsing so that the
    /// parser rejects a weekday that disagrees with the date.
    pub fn normalize(&self, raw: &str) -> Result<String, FormatError> {
        let raw = raw.trim();
        let (index, glyph, weekday) = raw
            .char_indices()
            .find_map(|(index, c)| weekday_for_glyph(c).map(|day| (index, c, day)))
            .ok_or_else(|| FormatError::UnknownWeekday {
                input: raw.to_string(),
            })?;

        let date = raw[..index].trim();
        let time = raw[index + glyph.len_utf8()..].trim();
        let spelled = format!("{date} {} {time}", weekday_name(weekday));

        let naive = NaiveDateTime::parse_from_str(&spelled, SOURCE_FORMAT).map_err(|err| {
            FormatError::Pattern {
                input: raw.to_string(),
                pattern: SOURCE_FORMAT,
                reason: err.to_string(),
            }
        })?;
        let local = self.localize(self.source, &naive, raw)?;

        Ok(local
            .with_timezone(&self.target)
            .format(NORMALIZED_FORMAT)
            .to_string())
    }

    /// Parses a normalized timestamp as an instant in the target zone.
    pub fn parse_normalized(&self, normalized: &str) -> Result<DateTime<Tz>, FormatError> {
        let naive = NaiveDateTime::parse_from_str(normalized.trim(), NORMALIZED_FORMAT).map_err(
            |err| FormatError::Pattern {
                input: normalized.to_string(),
                pattern: NORMALIZED_FORMAT,
                reason: err.to_string(),
            },
        )?;
        self.localize(self.target, &naive, normalized)
    }

    pub fn to_epoch_seconds(&self, normalized: &str) -> Result<i64, FormatError> {
        Ok(self.parse_normalized(normalized)?.timestamp())
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.target)
    }

    pub fn now_formatted(&self) -> String {
        self.now().format(NORMALIZED_FORMAT).to_string()
    }

    pub fn now_epoch(&self) -> i64 {
        self.now().timestamp()
    }

    /// True iff `normalized` lies in `[start of current hour, start of next hour)`.
    ///
    /// Stamps later in the current hour still match, so a source clock running
    /// a few minutes ahead loses nothing. Rows dated after the current hour
    /// never match.
    pub fn is_within_last_hour(&self, normalized: &str) -> Result<bool, FormatError> {
        let target = self.parse_normalized(normalized)?;
        let now = self.now();
        let hour_start = now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        let next_hour = hour_start + TimeDelta::hours(1);
        Ok(target >= hour_start && target < next_hour)
    }

    /// True iff `normalized` is on or after midnight (target zone) seven days ago.
    pub fn is_within_last_week(&self, normalized: &str) -> Result<bool, FormatError> {
        let target = self.parse_normalized(normalized)?;
        let cutoff_day = self
            .now()
            .date_naive()
            .checked_sub_days(Days::new(7))
            .unwrap_or(chrono::NaiveDate::MIN);
        let midnight = cutoff_day.and_hms_opt(0, 0, 0).ok_or_else(|| FormatError::Pattern {
            input: normalized.to_string(),
            pattern: NORMALIZED_FORMAT,
            reason: "cutoff day has no midnight".to_string(),
        })?;
        let cutoff = self.localize(self.target, &midnight, normalized)?;
        Ok(target >= cutoff)
    }

    pub fn is_within(&self, policy: WindowPolicy, normalized: &str) -> Result<bool, FormatError> {
        match policy {
            WindowPolicy::LastHour => self.is_within_last_hour(normalized),
            WindowPolicy::LastWeek => self.is_within_last_week(normalized),
        }
    }

    fn localize(
        &self,
        zone: Tz,
        naive: &NaiveDateTime,
        input: &str,
    ) -> Result<DateTime<Tz>, FormatError> {
        zone.from_local_datetime(naive)
            .single()
            .ok_or_else(|| FormatError::AmbiguousLocalTime {
                input: input.to_string(),
                zone: zone.name().to_string(),
            })
    }
}
