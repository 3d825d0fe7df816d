//! Busy intervals from the calendar.

use std::sync::Arc;

use tracing::{debug, instrument};
use zoomzone_core::{BusinessZone, TimeInterval};
use zoomzone_providers::{CalendarProvider, ProviderResult, busy_intervals};

use crate::upstream::Upstream;

/// Reads occupied time from the calendar provider.
///
/// Every call goes to the provider; nothing is cached between requests.
#[derive(Clone)]
pub struct BusyIntervalSource {
    calendar: Arc<dyn CalendarProvider>,
    upstream: Upstream,
    zone: BusinessZone,
}

impl BusyIntervalSource {
    pub fn new(calendar: Arc<dyn CalendarProvider>, upstream: Upstream, zone: BusinessZone) -> Self {
        Self {
            calendar,
            upstream,
            zone,
        }
    }

    pub fn calendar(&self) -> &Arc<dyn CalendarProvider> {
        &self.calendar
    }

    /// Busy intervals overlapping `range`, in UTC.
    #[instrument(skip(self), fields(start = %range.start, end = %range.end))]
    pub async fn list_busy(&self, range: TimeInterval) -> ProviderResult<Vec<TimeInterval>> {
        let calendar = self.calendar.as_ref();
        let events = self
            .upstream
            .call(calendar, |token| calendar.list_events(token, range))
            .await?;
        let busy = busy_intervals(&events, &self.zone);
        debug!(events = events.len(), busy = busy.len(), "calendar read");
        Ok(busy)
    }
}
