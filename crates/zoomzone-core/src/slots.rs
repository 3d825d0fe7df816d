//! Candidate slot generation for a single business day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{self, BusinessZone, TimeError, TimeInterval};

pub const DEFAULT_START_HOUR: u32 = 6;
pub const DEFAULT_END_HOUR: u32 = 22;
pub const DEFAULT_DURATION_MINUTES: u32 = 15;

/// Durations offered to visitors. Others are accepted and produce a grid
/// on their own cadence.
pub const ALLOWED_DURATIONS: [u32; 4] = [15, 30, 45, 60];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("business hours must satisfy start < end <= 24, got {start_hour}..{end_hour}")]
pub struct BusinessHoursError {
    pub start_hour: u32,
    pub end_hour: u32,
}

/// The daily window slots are drawn from, in local whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    start_hour: u32,
    end_hour: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
        }
    }
}

impl BusinessHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, BusinessHoursError> {
        if start_hour < end_hour && end_hour <= 24 {
            Ok(Self {
                start_hour,
                end_hour,
            })
        } else {
            Err(BusinessHoursError {
                start_hour,
                end_hour,
            })
        }
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }
}

/// A candidate meeting start. Generated per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Start instant.
    pub start: DateTime<Utc>,
    /// Local `HH:MM` label in the business zone.
    pub local_time: String,
    pub duration_minutes: u32,
    pub is_busy: bool,
}

impl Slot {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// The `[start, start + duration)` interval this slot would occupy.
    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start,
            end: self.end(),
        }
    }
}

/// Produces slots at `start_hour:00 + k*duration` strictly before `end_hour:00`.
///
/// When `date` is today in the business zone, slots that do not start
/// strictly after `now` are dropped. Other dates are never filtered by the
/// clock. Local times skipped by a DST transition produce no slot.
pub fn generate_slots(
    date: NaiveDate,
    duration_minutes: u32,
    hours: &BusinessHours,
    zone: &BusinessZone,
    now: DateTime<Utc>,
) -> Vec<Slot> {
    if duration_minutes == 0 {
        return Vec::new();
    }

    let is_today = zone.today(now) == date;
    let midnight = date.and_time(NaiveTime::MIN);
    let first = hours.start_hour * 60;
    let limit = hours.end_hour * 60;

    let mut slots = Vec::new();
    for offset in (first..limit).step_by(duration_minutes as usize) {
        let local = midnight + Duration::minutes(i64::from(offset));
        let start = match zone.local_to_utc(local) {
            Ok(start) => start,
            Err(err) => {
                tracing::debug!(%local, error = %err, "skipping slot");
                continue;
            }
        };
        if is_today && start <= now {
            continue;
        }
        slots.push(Slot {
            start,
            local_time: local.format("%H:%M").to_string(),
            duration_minutes,
            is_busy: false,
        });
    }
    slots
}

/// Parses raw request values and generates the slot grid.
pub fn slots_for_request(
    date: &str,
    duration_minutes: i64,
    hours: &BusinessHours,
    zone: &BusinessZone,
    now: DateTime<Utc>,
) -> Result<Vec<Slot>, TimeError> {
    let date = time::parse_date(date)?;
    let duration = time::validate_duration(duration_minutes)?;
    Ok(generate_slots(date, duration, hours, zone, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn labels(slots: &[Slot]) -> Vec<&str> {
        slots.iter().map(|s| s.local_time.as_str()).collect()
    }

    // A "now" well before any tested date
    fn long_ago() -> DateTime<Utc> {
        utc(2020, 1, 1, 0, 0, 0)
    }

    mod grid {
        use super::*;

        #[test]
        fn thirty_minute_day() {
            let slots = generate_slots(
                date(2024, 6, 10),
                30,
                &BusinessHours::default(),
                &BusinessZone::default(),
                long_ago(),
            );
            assert_eq!(slots.len(), 32);
            assert_eq!(slots[0].local_time, "06:00");
            assert_eq!(slots[1].local_time, "06:30");
            assert_eq!(slots[31].local_time, "21:30");
            assert!(slots.iter().all(|s| !s.is_busy && s.duration_minutes == 30));
            // 06:00 MDT
            assert_eq!(slots[0].start, utc(2024, 6, 10, 12, 0, 0));
        }

        #[test]
        fn slots_are_exact_multiples_before_end() {
            let hours = BusinessHours::default();
            for d in [1_u32, 7, 15, 30, 45, 60, 90, 600, 2000] {
                let slots = generate_slots(
                    date(2024, 6, 10),
                    d,
                    &hours,
                    &BusinessZone::new(chrono_tz::UTC),
                    long_ago(),
                );
                let span = (DEFAULT_END_HOUR - DEFAULT_START_HOUR) * 60;
                assert_eq!(slots.len() as u32, span.div_ceil(d), "duration {d}");
                for (k, slot) in slots.iter().enumerate() {
                    let expected = utc(2024, 6, 10, DEFAULT_START_HOUR, 0, 0)
                        + Duration::minutes(i64::from(d) * k as i64);
                    assert_eq!(slot.start, expected);
                    assert!(slot.start < utc(2024, 6, 10, DEFAULT_END_HOUR, 0, 0));
                }
            }
        }

        #[test]
        fn off_menu_duration_uses_own_cadence() {
            let slots = generate_slots(
                date(2024, 6, 10),
                50,
                &BusinessHours::new(9, 12).unwrap(),
                &BusinessZone::default(),
                long_ago(),
            );
            assert_eq!(labels(&slots), vec!["09:00", "09:50", "10:40", "11:30"]);
        }

        #[test]
        fn slot_interval_matches_duration() {
            let slots = generate_slots(
                date(2024, 6, 10),
                45,
                &BusinessHours::default(),
                &BusinessZone::default(),
                long_ago(),
            );
            let interval = slots[0].interval();
            assert_eq!(interval.duration(), Duration::minutes(45));
        }

        #[test]
        fn huge_duration_yields_only_the_opening_slot() {
            let slots = generate_slots(
                date(2024, 6, 10),
                u32::MAX - 100,
                &BusinessHours::default(),
                &BusinessZone::default(),
                long_ago(),
            );
            assert_eq!(labels(&slots), vec!["06:00"]);
        }

        #[test]
        fn zero_duration_yields_nothing() {
            assert!(
                generate_slots(
                    date(2024, 6, 10),
                    0,
                    &BusinessHours::default(),
                    &BusinessZone::default(),
                    long_ago(),
                )
                .is_empty()
            );
        }
    }

    mod today {
        use super::*;

        #[test]
        fn past_slots_are_dropped() {
            // 09:10 MDT on the 10th
            let now = utc(2024, 6, 10, 15, 10, 0);
            let slots = generate_slots(
                date(2024, 6, 10),
                30,
                &BusinessHours::default(),
                &BusinessZone::default(),
                now,
            );
            assert_eq!(slots[0].local_time, "09:30");
            assert!(slots.iter().all(|s| s.start > now));
        }

        #[test]
        fn slot_starting_exactly_now_is_dropped() {
            let now = utc(2024, 6, 10, 15, 0, 0);
            let slots = generate_slots(
                date(2024, 6, 10),
                30,
                &BusinessHours::default(),
                &BusinessZone::default(),
                now,
            );
            assert_eq!(slots[0].local_time, "09:30");
        }

        #[test]
        fn future_dates_are_not_filtered() {
            let now = utc(2024, 6, 10, 15, 10, 0);
            let slots = generate_slots(
                date(2024, 6, 11),
                30,
                &BusinessHours::default(),
                &BusinessZone::default(),
                now,
            );
            assert_eq!(slots.len(), 32);
        }

        #[test]
        fn late_evening_utc_still_counts_as_local_today() {
            // 03:00Z on the 11th = 21:00 MDT on the 10th
            let now = utc(2024, 6, 11, 3, 0, 0);
            let slots = generate_slots(
                date(2024, 6, 10),
                30,
                &BusinessHours::default(),
                &BusinessZone::default(),
                now,
            );
            assert_eq!(labels(&slots), vec!["21:30"]);
        }
    }

    mod request {
        use super::*;

        #[test]
        fn rejects_bad_input() {
            let hours = BusinessHours::default();
            let zone = BusinessZone::default();
            assert!(matches!(
                slots_for_request("not-a-date", 30, &hours, &zone, long_ago()),
                Err(TimeError::InvalidDate { .. })
            ));
            assert!(matches!(
                slots_for_request("2024-06-10", 0, &hours, &zone, long_ago()),
                Err(TimeError::InvalidDuration { minutes: 0 })
            ));
            assert!(slots_for_request("2024-06-10", -30, &hours, &zone, long_ago()).is_err());
        }

        #[test]
        fn parses_and_generates() {
            let slots = slots_for_request(
                "2024-06-10",
                60,
                &BusinessHours::default(),
                &BusinessZone::default(),
                long_ago(),
            )
            .unwrap();
            assert_eq!(slots.len(), 16);
        }

        #[test]
        fn largest_accepted_duration_stays_on_the_grid() {
            let slots = slots_for_request(
                "2024-06-10",
                4_294_967_000,
                &BusinessHours::default(),
                &BusinessZone::default(),
                long_ago(),
            )
            .unwrap();
            assert_eq!(labels(&slots), vec!["06:00"]);
            assert_eq!(slots[0].start, utc(2024, 6, 10, 12, 0, 0));
        }
    }

    #[test]
    fn business_hours_validation() {
        assert!(BusinessHours::new(6, 22).is_ok());
        assert!(BusinessHours::new(0, 24).is_ok());
        assert!(BusinessHours::new(22, 6).is_err());
        assert!(BusinessHours::new(9, 9).is_err());
        assert!(BusinessHours::new(6, 25).is_err());
    }
}
