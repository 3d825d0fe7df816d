//! Booking records and the values that flow around them.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{self, BusinessZone, TimeError, TimeInterval};

/// Default reminder lookahead, in minutes.
pub const DEFAULT_REMINDER_LOOKAHEAD_MINUTES: u32 = 60;

/// Identifier of a persisted booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BookingId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BookingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A confirmed booking.
///
/// Created once after every remote side effect succeeded. `reminder_sent`
/// only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub name: String,
    pub email: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: u32,
    pub meeting_link: String,
    #[serde(default)]
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reminder_sent: bool,
}

impl Booking {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start,
            end: self.end,
        }
    }

    /// Whether a reminder should go out in a sweep at `now`:
    /// not yet reminded and `now < start <= now + lookahead`.
    pub fn is_due_for_reminder(&self, now: DateTime<Utc>, lookahead: Duration) -> bool {
        !self.reminder_sent && self.start > now && self.start <= now + lookahead
    }
}

/// Picks the bookings a sweep at `now` must remind, each id at most once.
pub fn select_due(bookings: &[Booking], now: DateTime<Utc>, lookahead: Duration) -> Vec<&Booking> {
    let mut seen = HashSet::new();
    bookings
        .iter()
        .filter(|b| b.is_due_for_reminder(now, lookahead))
        .filter(|b| seen.insert(b.id.clone()))
        .collect()
}

/// Partial update applied through the booking store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_sent: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("booking {id} already had its reminder sent; it cannot be reset")]
    ReminderReset { id: BookingId },
}

impl BookingPatch {
    pub fn reminder_sent() -> Self {
        Self {
            reminder_sent: Some(true),
        }
    }

    /// Applies the patch in place.
    pub fn apply(&self, booking: &mut Booking) -> Result<(), PatchError> {
        if let Some(sent) = self.reminder_sent {
            if booking.reminder_sent && !sent {
                return Err(PatchError::ReminderReset {
                    id: booking.id.clone(),
                });
            }
            booking.reminder_sent = sent;
        }
        Ok(())
    }
}

/// Raw booking input as submitted by a visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    /// Local date, `YYYY-MM-DD`.
    pub date: String,
    /// Local start time, `HH:MM`.
    pub time: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error(transparent)]
    Time(#[from] TimeError),
}

/// A booking request whose fields have been checked and converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub name: String,
    pub email: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
    pub interval: TimeInterval,
}

impl BookingRequest {
    /// Checks required fields and resolves the meeting interval in `zone`.
    pub fn validate(&self, zone: &BusinessZone) -> Result<ValidatedRequest, InputError> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        let date = required("date", &self.date)?;
        let clock = required("time", &self.time)?;

        if !looks_like_email(email) {
            return Err(InputError::InvalidEmail(email.to_string()));
        }

        let date = time::parse_date(date)?;
        let clock = time::parse_clock_time(clock)?;
        let duration_minutes = time::validate_duration(self.duration_minutes)?;
        let interval = zone.meeting_interval(date, clock, duration_minutes)?;

        Ok(ValidatedRequest {
            name: name.to_string(),
            email: email.to_string(),
            date,
            time: clock,
            duration_minutes,
            interval,
        })
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(InputError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// What a successful booking hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
    pub meeting_link: String,
    pub calendar_event_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Notifications that could not be delivered. The booking stands regardless.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_failures: Vec<String>,
}

/// Which step of reminding a booking failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStage {
    Send,
    MarkSent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub booking_id: BookingId,
    pub stage: SweepStage,
    pub error: String,
}

/// Outcome of one reminder sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub ran_at: DateTime<Utc>,
    pub sent: Vec<BookingId>,
    pub failed: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn new(ran_at: DateTime<Utc>) -> Self {
        Self {
            ran_at,
            sent: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn booking(id: &str, start: DateTime<Utc>, reminder_sent: bool) -> Booking {
        Booking {
            id: id.into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            start,
            end: start + Duration::minutes(15),
            duration_minutes: 15,
            meeting_link: "https://zoom.us/j/1".into(),
            calendar_event_id: Some("evt".into()),
            created_at: utc(2024, 6, 1, 0, 0, 0),
            reminder_sent,
        }
    }

    fn request() -> BookingRequest {
        BookingRequest {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            date: "2024-06-10".into(),
            time: "08:00".into(),
            duration_minutes: 15,
        }
    }

    mod reminders {
        use super::*;

        fn hour() -> Duration {
            Duration::minutes(60)
        }

        #[test]
        fn window_is_exclusive_of_now_inclusive_of_lookahead() {
            let now = utc(2024, 6, 10, 13, 0, 0);
            assert!(!booking("a", now, false).is_due_for_reminder(now, hour()));
            assert!(booking("b", utc(2024, 6, 10, 14, 0, 0), false).is_due_for_reminder(now, hour()));
            assert!(
                !booking("c", utc(2024, 6, 10, 14, 0, 1), false).is_due_for_reminder(now, hour())
            );
            assert!(
                !booking("d", utc(2024, 6, 10, 12, 0, 0), false).is_due_for_reminder(now, hour())
            );
        }

        #[test]
        fn already_reminded_is_never_due() {
            let now = utc(2024, 6, 10, 13, 10, 0);
            assert!(!booking("a", utc(2024, 6, 10, 13, 50, 0), true).is_due_for_reminder(now, hour()));
        }

        #[test]
        fn select_due_skips_duplicates() {
            let now = utc(2024, 6, 10, 13, 10, 0);
            let start = utc(2024, 6, 10, 13, 50, 0);
            let bookings = vec![
                booking("a", start, false),
                booking("a", start, false),
                booking("b", start, true),
                booking("c", utc(2024, 6, 10, 18, 0, 0), false),
            ];
            let due: Vec<&str> = select_due(&bookings, now, hour())
                .iter()
                .map(|b| b.id.as_str())
                .collect();
            assert_eq!(due, vec!["a"]);
        }
    }

    mod patch {
        use super::*;

        #[test]
        fn marks_reminder_sent() {
            let mut b = booking("a", utc(2024, 6, 10, 14, 0, 0), false);
            BookingPatch::reminder_sent().apply(&mut b).unwrap();
            assert!(b.reminder_sent);
            // applying again is harmless
            BookingPatch::reminder_sent().apply(&mut b).unwrap();
            assert!(b.reminder_sent);
        }

        #[test]
        fn refuses_to_reset_reminder() {
            let mut b = booking("a", utc(2024, 6, 10, 14, 0, 0), true);
            let patch = BookingPatch {
                reminder_sent: Some(false),
            };
            assert!(matches!(
                patch.apply(&mut b),
                Err(PatchError::ReminderReset { .. })
            ));
            assert!(b.reminder_sent);
        }

        #[test]
        fn empty_patch_changes_nothing() {
            let mut b = booking("a", utc(2024, 6, 10, 14, 0, 0), false);
            let before = b.clone();
            BookingPatch::default().apply(&mut b).unwrap();
            assert_eq!(b, before);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn valid_request_resolves_interval() {
            let validated = request().validate(&BusinessZone::default()).unwrap();
            assert_eq!(validated.name, "Ada Lovelace");
            assert_eq!(validated.duration_minutes, 15);
            assert_eq!(validated.interval.start, utc(2024, 6, 10, 14, 0, 0));
            assert_eq!(validated.interval.end, utc(2024, 6, 10, 14, 15, 0));
        }

        #[test]
        fn blank_fields_are_missing() {
            let zone = BusinessZone::default();
            let mut r = request();
            r.name = "   ".into();
            assert_eq!(r.validate(&zone), Err(InputError::MissingField("name")));

            let mut r = request();
            r.time = String::new();
            assert_eq!(r.validate(&zone), Err(InputError::MissingField("time")));
        }

        #[test]
        fn bad_email_and_duration() {
            let zone = BusinessZone::default();
            let mut r = request();
            r.email = "not-an-email".into();
            assert!(matches!(r.validate(&zone), Err(InputError::InvalidEmail(_))));

            let mut r = request();
            r.duration_minutes = 0;
            assert!(matches!(
                r.validate(&zone),
                Err(InputError::Time(TimeError::InvalidDuration { .. }))
            ));
        }

        #[test]
        fn unparsable_date() {
            let mut r = request();
            r.date = "June 10".into();
            assert!(matches!(
                r.validate(&BusinessZone::default()),
                Err(InputError::Time(TimeError::InvalidDate { .. }))
            ));
        }
    }

    #[test]
    fn booking_serde_defaults() {
        let json = r#"{
            "id": "abc",
            "name": "Ada",
            "email": "ada@example.com",
            "start": "2024-06-10T14:00:00Z",
            "end": "2024-06-10T14:15:00Z",
            "duration_minutes": 15,
            "meeting_link": "https://zoom.us/j/1",
            "created_at": "2024-06-01T00:00:00Z"
        }"#;
        let parsed: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id.as_str(), "abc");
        assert!(!parsed.reminder_sent);
        assert!(parsed.calendar_event_id.is_none());
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(BookingId::generate(), BookingId::generate());
    }
}
