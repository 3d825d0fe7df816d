//! Raw event type from calendar providers.
//!
//! A [`RawEvent`] is what a calendar backend reports before it is turned
//! into a busy interval. Only the fields that matter for availability are
//! kept.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The time specification for a raw event.
///
/// Timed events carry an instant; all-day events carry a date whose
/// meaning depends on the provider's end-date convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific instant.
    DateTime(DateTime<Utc>),
    /// An all-day event date (no specific time).
    Date(NaiveDate),
}

impl RawEventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// Event status as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    /// Maps the provider's status string. Unknown values count as confirmed.
    pub fn from_provider(status: Option<&str>) -> Self {
        match status {
            Some("cancelled") => Self::Cancelled,
            Some("tentative") => Self::Tentative,
            _ => Self::Confirmed,
        }
    }
}

/// A calendar event as fetched from a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    pub start: RawEventTime,
    pub end: RawEventTime,
    /// Set for instances of an expanded recurring series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
}

impl RawEvent {
    pub fn new(id: impl Into<String>, start: RawEventTime, end: RawEventTime) -> Self {
        Self {
            id: id.into(),
            summary: None,
            status: EventStatus::Confirmed,
            start,
            end,
            recurring_event_id: None,
        }
    }

    /// Shorthand for a timed event.
    pub fn timed(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(id, RawEventTime::DateTime(start), RawEventTime::DateTime(end))
    }

    /// Shorthand for an all-day event.
    pub fn all_day(id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(id, RawEventTime::Date(start), RawEventTime::Date(end))
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == EventStatus::Cancelled
    }

    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_mapping() {
        assert_eq!(
            EventStatus::from_provider(Some("cancelled")),
            EventStatus::Cancelled
        );
        assert_eq!(
            EventStatus::from_provider(Some("tentative")),
            EventStatus::Tentative
        );
        assert_eq!(
            EventStatus::from_provider(Some("confirmed")),
            EventStatus::Confirmed
        );
        assert_eq!(EventStatus::from_provider(None), EventStatus::Confirmed);
    }

    #[test]
    fn builders() {
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap();
        let event = RawEvent::timed("e1", start, start + chrono::Duration::hours(1))
            .with_summary("Standup")
            .with_status(EventStatus::Cancelled);
        assert!(event.is_cancelled());
        assert!(!event.is_all_day());
        assert_eq!(event.summary.as_deref(), Some("Standup"));

        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert!(RawEvent::all_day("e2", day, day.succ_opt().unwrap()).is_all_day());
    }

    #[test]
    fn serde_round_trip_keeps_time_kind() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let event = RawEvent::all_day("e2", day, day);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"Date""#));
        let parsed: RawEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
