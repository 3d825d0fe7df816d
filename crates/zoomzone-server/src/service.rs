//! Wires the collaborators into the services the daemon serves.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use zoomzone_core::{
    BookingConfirmation, BookingRequest, BusinessHours, BusinessZone,
    DEFAULT_REMINDER_LOOKAHEAD_MINUTES, Slot,
};
use zoomzone_providers::{BookingStore, CalendarProvider, CredentialStore, MeetingProvider, Notifier};

use crate::availability::AvailabilityService;
use crate::busy::BusyIntervalSource;
use crate::error::BookingError;
use crate::notify::{MessageTemplates, NotifyConfig};
use crate::orchestrator::{BookingOrchestrator, OrchestratorParts};
use crate::scheduler::SweepResult;
use crate::sweeper::ReminderSweeper;
use crate::upstream::Upstream;

/// The external systems a booking touches.
#[derive(Clone)]
pub struct Collaborators {
    pub calendar: Arc<dyn CalendarProvider>,
    pub meetings: Arc<dyn MeetingProvider>,
    pub credentials: Arc<dyn CredentialStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub zone: BusinessZone,
    pub hours: BusinessHours,
    /// How far ahead a sweep looks for bookings to remind.
    pub reminder_lookahead: Duration,
    pub notify: NotifyConfig,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            zone: BusinessZone::default(),
            hours: BusinessHours::default(),
            reminder_lookahead: Duration::minutes(i64::from(DEFAULT_REMINDER_LOOKAHEAD_MINUTES)),
            notify: NotifyConfig::default(),
        }
    }
}

/// Availability, booking and reminders over one set of collaborators.
#[derive(Clone)]
pub struct BookingService {
    availability: AvailabilityService,
    orchestrator: BookingOrchestrator,
    sweeper: ReminderSweeper,
    zone: BusinessZone,
    delivers_notifications: bool,
}

impl BookingService {
    pub fn new(settings: BookingSettings, parts: Collaborators) -> Self {
        let zone = settings.zone;
        let delivers_notifications = parts.notifier.delivers();
        if !delivers_notifications {
            warn!(
                "notifications are only written to the log; participants and the operator \
                 receive no email, and reminders are still marked as sent"
            );
        }
        let upstream = Upstream::new(parts.credentials);
        let busy = BusyIntervalSource::new(parts.calendar, upstream.clone(), zone);
        let availability = AvailabilityService::new(busy, settings.hours, zone);
        let templates = MessageTemplates::new(settings.notify, zone);

        let orchestrator = BookingOrchestrator::new(OrchestratorParts {
            availability: availability.clone(),
            meetings: parts.meetings,
            bookings: parts.bookings.clone(),
            notifier: parts.notifier.clone(),
            upstream,
            templates: templates.clone(),
            zone,
        });
        let sweeper = ReminderSweeper::new(
            parts.bookings,
            parts.notifier,
            templates,
            settings.reminder_lookahead,
        );

        Self {
            availability,
            orchestrator,
            sweeper,
            zone,
            delivers_notifications,
        }
    }

    pub fn zone(&self) -> BusinessZone {
        self.zone
    }

    /// False when the notifier only logs messages.
    pub fn delivers_notifications(&self) -> bool {
        self.delivers_notifications
    }

    pub async fn slots(
        &self,
        date: &str,
        duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>, BookingError> {
        self.availability.slots(date, duration_minutes, now).await
    }

    pub async fn book(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingConfirmation, BookingError> {
        self.orchestrator.book(request, now).await
    }

    /// One reminder sweep. The daemon only calls this through the
    /// scheduler, so sweeps never overlap.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepResult {
        self.sweeper.sweep(now).await
    }
}
