//! RawEvent to busy-interval conversion.
//!
//! Calendar events arrive in provider shapes: timed events with instants,
//! all-day events with dates whose end is exclusive. Everything is turned
//! into [`TimeInterval`]s in UTC here so availability only ever compares
//! instants.

use chrono::NaiveDate;
use tracing::warn;
use zoomzone_core::{BusinessZone, TimeError, TimeInterval};

use crate::raw_event::{RawEvent, RawEventTime};

/// Converts a raw event into the interval it blocks.
///
/// Returns `None` for cancelled events and for events whose times cannot be
/// turned into a non-empty interval (those are logged and skipped).
pub fn busy_interval(raw: &RawEvent, zone: &BusinessZone) -> Option<TimeInterval> {
    if raw.is_cancelled() {
        return None;
    }

    match convert(raw, zone) {
        Ok(interval) => Some(interval),
        Err(err) => {
            warn!(event_id = %raw.id, error = %err, "skipping event with unusable times");
            None
        }
    }
}

/// Converts every usable event of a calendar listing.
pub fn busy_intervals(raw: &[RawEvent], zone: &BusinessZone) -> Vec<TimeInterval> {
    raw.iter().filter_map(|e| busy_interval(e, zone)).collect()
}

fn convert(raw: &RawEvent, zone: &BusinessZone) -> Result<TimeInterval, TimeError> {
    match (&raw.start, &raw.end) {
        (RawEventTime::DateTime(start), RawEventTime::DateTime(end)) => {
            TimeInterval::new(*start, *end)
        }
        (RawEventTime::Date(first), RawEventTime::Date(end)) => {
            zone.all_day_interval(*first, last_inclusive_day(*first, *end))
        }
        // Mixed shapes: treat the date side as the whole local day.
        (RawEventTime::Date(first), RawEventTime::DateTime(end)) => {
            let start = zone.day_bounds(*first)?.start;
            TimeInterval::new(start, *end)
        }
        (RawEventTime::DateTime(start), RawEventTime::Date(last)) => {
            let end = zone.all_day_interval(*last, *last)?.end;
            TimeInterval::new(*start, end)
        }
    }
}

/// All-day end dates are exclusive; a single-day event ends the next day.
/// An end on or before the start is taken as the start day itself.
fn last_inclusive_day(first: NaiveDate, end: NaiveDate) -> NaiveDate {
    if end > first {
        end.pred_opt().unwrap_or(first)
    } else {
        first
    }
}
