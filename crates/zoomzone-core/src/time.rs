//! Time types and the single business-timezone conversion.
//!
//! Every instant the rest of the workspace handles is a UTC [`DateTime`].
//! Wall-clock values only appear at two edges: parsing the visitor's
//! `date` + `HH:MM` input, and formatting instants for the calendar
//! provider. Both go through [`BusinessZone`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default IANA zone for the booking calendar.
pub const DEFAULT_TIMEZONE: &str = "America/Denver";

/// Format used for local date-times exchanged with the calendar provider.
pub const PROVIDER_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors raised while parsing or converting times.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("invalid time '{input}', expected HH:MM")]
    InvalidTime { input: String },

    #[error("duration must be a positive number of minutes, got {minutes}")]
    InvalidDuration { minutes: i64 },

    #[error("interval start {start} is not before end {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("local time {local} does not exist in {zone}")]
    NonexistentLocalTime {
        local: NaiveDateTime,
        zone: &'static str,
    },

    #[error("unknown timezone '{name}'")]
    UnknownTimezone { name: String },
}

/// A half-open `[start, end)` interval of UTC instants with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Start of the interval (inclusive).
    pub start: DateTime<Utc>,
    /// End of the interval (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Creates an interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(TimeError::InvalidInterval { start, end })
        }
    }

    /// Creates an interval of `minutes` starting at `start`.
    pub fn starting_at(start: DateTime<Utc>, minutes: u32) -> Result<Self, TimeError> {
        Self::new(start, start + Duration::minutes(i64::from(minutes)))
    }

    /// Strict half-open overlap: `self.start < other.end && self.end > other.start`.
    ///
    /// This is the only conflict predicate in the workspace. Intervals that
    /// merely touch (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Returns true if `instant` falls within `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| TimeError::InvalidDate {
        input: input.to_string(),
    })
}

/// Parses an `HH:MM` wall-clock time.
pub fn parse_clock_time(input: &str) -> Result<NaiveTime, TimeError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M").map_err(|_| TimeError::InvalidTime {
        input: input.to_string(),
    })
}

/// Validates a duration in minutes, returning it as an unsigned count.
pub fn validate_duration(minutes: i64) -> Result<u32, TimeError> {
    if minutes <= 0 {
        return Err(TimeError::InvalidDuration { minutes });
    }
    u32::try_from(minutes).map_err(|_| TimeError::InvalidDuration { minutes })
}

/// A local timestamp in the shape calendar providers expect:
/// wall-clock date-time without offset, plus the IANA zone name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLocalTime {
    pub date_time: String,
    pub time_zone: String,
}

/// The one configured business timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessZone {
    tz: Tz,
}

impl Default for BusinessZone {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::Denver,
        }
    }
}

impl BusinessZone {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Looks up a zone by IANA name.
    pub fn from_name(name: &str) -> Result<Self, TimeError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| TimeError::UnknownTimezone {
                name: name.to_string(),
            })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// IANA name of the zone, e.g. `America/Denver`.
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Converts a local wall-clock date-time to UTC.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant.
    /// Times skipped by a DST spring-forward are rejected.
    pub fn local_to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>, TimeError> {
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or(TimeError::NonexistentLocalTime {
                local,
                zone: self.name(),
            })
    }

    /// Builds the UTC interval for a meeting starting at `time` on `date`
    /// (both local) and lasting `duration_minutes`.
    pub fn meeting_interval(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
    ) -> Result<TimeInterval, TimeError> {
        let start = self.local_to_utc(date.and_time(time))?;
        TimeInterval::starting_at(start, duration_minutes)
    }

    /// The UTC interval covered by all-day dates `first..=last`, spanning
    /// `00:00:00` on `first` to `23:59:59` on `last`, local time.
    pub fn all_day_interval(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<TimeInterval, TimeError> {
        let start = self.local_to_utc(first.and_time(NaiveTime::MIN))?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        let end = self.local_to_utc(last.and_time(end_of_day))?;
        TimeInterval::new(start, end)
    }

    /// The full local day `[00:00, next 00:00)` as a UTC interval.
    pub fn day_bounds(&self, date: NaiveDate) -> Result<TimeInterval, TimeError> {
        let next = date.succ_opt().ok_or_else(|| TimeError::InvalidDate {
            input: date.to_string(),
        })?;
        let start = self.local_to_utc(date.and_time(NaiveTime::MIN))?;
        let end = self.local_to_utc(next.and_time(NaiveTime::MIN))?;
        TimeInterval::new(start, end)
    }

    /// The local calendar date of `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_local(now).date_naive()
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// Formats an instant for the calendar provider.
    pub fn provider_local(&self, instant: DateTime<Utc>) -> ProviderLocalTime {
        ProviderLocalTime {
            date_time: self
                .to_local(instant)
                .format(PROVIDER_LOCAL_FORMAT)
                .to_string(),
            time_zone: self.name().to_string(),
        }
    }

    /// Parses a provider local date-time back into UTC.
    pub fn parse_provider_local(&self, date_time: &str) -> Result<DateTime<Utc>, TimeError> {
        let naive = NaiveDateTime::parse_from_str(date_time.trim(), PROVIDER_LOCAL_FORMAT)
            .map_err(|_| TimeError::InvalidTime {
                input: date_time.to_string(),
            })?;
        self.local_to_utc(naive)
    }

    /// Human-readable local rendering, e.g. `2024-06-10 08:00 MDT`.
    pub fn display(&self, instant: DateTime<Utc>) -> String {
        self.to_local(instant).format("%Y-%m-%d %H:%M %Z").to_string()
    }

    /// Local `HH:MM` label for an instant.
    pub fn clock_label(&self, instant: DateTime<Utc>) -> String {
        self.to_local(instant).format("%H:%M").to_string()
    }
}
