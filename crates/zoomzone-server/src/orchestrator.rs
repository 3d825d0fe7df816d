//! The booking transaction.
//!
//! A booking walks six steps in order and stops at the first failure:
//!
//! 1. validate the request
//! 2. re-check the slot against the calendar
//! 3. create the video meeting
//! 4. create the calendar event carrying the join link
//! 5. persist the booking record
//! 6. notify the participant and the operator
//!
//! Steps 3 and 4 refresh an expired credential once and retry once. Nothing
//! is rolled back: a failure after step 3 leaves the meeting (and possibly
//! the event) in place and is reported as
//! [`BookingError::PartialBookingFailure`]. Notification failures are
//! collected in the confirmation and never fail the booking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};
use zoomzone_core::{
    Booking, BookingConfirmation, BookingId, BookingRequest, BusinessZone, ValidatedRequest,
};
use zoomzone_providers::{
    BookingStore, CalendarProvider, MeetingProvider, MeetingResource, NewCalendarEvent, NewMeeting,
    Notifier, ZOOM,
};

use crate::availability::AvailabilityService;
use crate::error::{BookingError, BookingStage};
use crate::notify::MessageTemplates;
use crate::upstream::Upstream;

#[derive(Clone)]
pub struct BookingOrchestrator {
    availability: AvailabilityService,
    calendar: Arc<dyn CalendarProvider>,
    meetings: Arc<dyn MeetingProvider>,
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    upstream: Upstream,
    templates: MessageTemplates,
    zone: BusinessZone,
}

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct OrchestratorParts {
    pub availability: AvailabilityService,
    pub meetings: Arc<dyn MeetingProvider>,
    pub bookings: Arc<dyn BookingStore>,
    pub notifier: Arc<dyn Notifier>,
    pub upstream: Upstream,
    pub templates: MessageTemplates,
    pub zone: BusinessZone,
}

impl BookingOrchestrator {
    pub fn new(parts: OrchestratorParts) -> Self {
        Self {
            calendar: parts.availability.busy_source().calendar().clone(),
            availability: parts.availability,
            meetings: parts.meetings,
            bookings: parts.bookings,
            notifier: parts.notifier,
            upstream: parts.upstream,
            templates: parts.templates,
            zone: parts.zone,
        }
    }

    /// Runs the booking transaction for `request`, stamping the record with
    /// `now`.
    #[instrument(
        skip(self, request),
        fields(date = %request.date, time = %request.time, duration = request.duration_minutes)
    )]
    pub async fn book(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingConfirmation, BookingError> {
        let request = request.validate(&self.zone)?;
        if request.interval.start <= now {
            return Err(BookingError::invalid_input("the requested slot has already started"));
        }

        self.availability.ensure_free(&request.interval).await?;

        let meeting = self.create_meeting(&request).await?;
        let meeting_link = meeting.join_url;
        info!(meeting_id = ?meeting.id, "meeting created");

        let event_id = self.create_event(&request, &meeting_link).await?;

        let booking = Booking {
            id: BookingId::generate(),
            name: request.name.clone(),
            email: request.email.clone(),
            start: request.interval.start,
            end: request.interval.end,
            duration_minutes: request.duration_minutes,
            meeting_link: meeting_link.clone(),
            calendar_event_id: Some(event_id.clone()),
            created_at: now,
            reminder_sent: false,
        };
        let booking_id = match self.bookings.insert(booking.clone()).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    error = %e,
                    meeting_link = %meeting_link,
                    calendar_event_id = %event_id,
                    "booking not persisted; meeting and event need manual cleanup"
                );
                return Err(BookingError::PartialBookingFailure {
                    stage: BookingStage::PersistBooking,
                    meeting_link,
                    calendar_event_id: Some(event_id),
                    message: e.to_string(),
                });
            }
        };
        info!(booking_id = %booking_id, start = %booking.start, "booking confirmed");

        let notification_failures = self.notify(&booking).await;

        Ok(BookingConfirmation {
            booking_id,
            meeting_link,
            calendar_event_id: event_id,
            start: booking.start,
            end: booking.end,
            notification_failures,
        })
    }

    async fn create_meeting(
        &self,
        request: &ValidatedRequest,
    ) -> Result<MeetingResource, BookingError> {
        let meeting = NewMeeting {
            topic: format!("Meeting with {}", request.name),
            start: request.interval.start,
            duration_minutes: request.duration_minutes,
        };
        let meetings = self.meetings.as_ref();
        self.upstream
            .call(meetings, |token| meetings.create_meeting(token, meeting.clone()))
            .await
            .map_err(|e| {
                warn!(error = %e, "meeting creation failed");
                BookingError::upstream(ZOOM, &e)
            })
    }

    async fn create_event(
        &self,
        request: &ValidatedRequest,
        meeting_link: &str,
    ) -> Result<String, BookingError> {
        let event = NewCalendarEvent {
            summary: format!("Zoom Meeting with {}", request.name),
            start: request.interval.start,
            end: request.interval.end,
            attendees: vec![request.email.clone()],
            description: format!("Join Zoom: {meeting_link}"),
        };
        let calendar = self.calendar.as_ref();
        match self
            .upstream
            .call(calendar, |token| calendar.create_event(token, event.clone()))
            .await
        {
            Ok(created) => Ok(created.id),
            Err(e) => {
                error!(
                    error = %e,
                    meeting_link = %meeting_link,
                    "calendar event not created; meeting needs manual cleanup"
                );
                Err(BookingError::PartialBookingFailure {
                    stage: BookingStage::CreateCalendarEvent,
                    meeting_link: meeting_link.to_string(),
                    calendar_event_id: None,
                    message: e.to_string(),
                })
            }
        }
    }

    async fn notify(&self, booking: &Booking) -> Vec<String> {
        let mut messages = vec![self.templates.participant_confirmation(booking)];
        messages.extend(self.templates.operator_notice(booking));

        let mut failures = Vec::new();
        for message in messages {
            let to = message.to.clone();
            if let Err(e) = self.notifier.send(message).await {
                warn!(to = %to, error = %e, "notification failed");
                failures.push(format!("{to}: {e}"));
            }
        }
        failures
    }
}
