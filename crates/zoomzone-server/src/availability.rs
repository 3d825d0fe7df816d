//! Slot listing and the pre-booking availability check.
//!
//! Both go through [`first_conflict`] over freshly read busy intervals, so
//! a slot shown as free is one the booking path accepts.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};
use zoomzone_core::time::{parse_date, validate_duration};
use zoomzone_core::{
    BusinessHours, BusinessZone, Slot, TimeInterval, first_conflict, generate_slots, reconcile,
};
use zoomzone_providers::GOOGLE;

use crate::busy::BusyIntervalSource;
use crate::error::BookingError;

#[derive(Clone)]
pub struct AvailabilityService {
    busy: BusyIntervalSource,
    hours: BusinessHours,
    zone: BusinessZone,
}

impl AvailabilityService {
    pub fn new(busy: BusyIntervalSource, hours: BusinessHours, zone: BusinessZone) -> Self {
        Self { busy, hours, zone }
    }

    pub fn busy_source(&self) -> &BusyIntervalSource {
        &self.busy
    }

    /// Slots for `date` with their busy flags.
    ///
    /// `date` is `YYYY-MM-DD` in the business zone. On the current local
    /// day, slots that already started are left out.
    #[instrument(skip(self))]
    pub async fn slots(
        &self,
        date: &str,
        duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>, BookingError> {
        let date = parse_date(date)?;
        let duration = validate_duration(duration_minutes)?;
        let slots = generate_slots(date, duration, &self.hours, &self.zone, now);
        let (Some(first), Some(last)) = (slots.first(), slots.last()) else {
            debug!("no candidate slots left");
            return Ok(slots);
        };

        // The last slot may run past local midnight.
        let window = TimeInterval::new(first.start, last.end())?;
        let busy = self.busy.list_busy(window).await.map_err(|e| {
            warn!(error = %e, "could not read busy intervals");
            BookingError::upstream(GOOGLE, &e)
        })?;
        Ok(reconcile(slots, &busy))
    }

    /// Fails with [`BookingError::SlotConflict`] if `interval` overlaps any
    /// busy interval right now.
    #[instrument(skip(self), fields(start = %interval.start, end = %interval.end))]
    pub async fn ensure_free(&self, interval: &TimeInterval) -> Result<(), BookingError> {
        let busy = self.busy.list_busy(*interval).await.map_err(|e| {
            warn!(error = %e, "could not re-check availability");
            BookingError::upstream(GOOGLE, &e)
        })?;
        match first_conflict(interval, &busy) {
            Some(conflict) => {
                debug!(conflict_start = %conflict.start, conflict_end = %conflict.end, "slot taken");
                Err(BookingError::conflict(conflict))
            }
            None => Ok(()),
        }
    }
}
