//! Reminder sweeps.
//!
//! A sweep reads every booking, picks those starting within the lookahead
//! window that were not reminded yet, and for each one sends the reminder
//! and then marks it sent. Bookings are handled independently: a failure is
//! recorded in the [`SweepReport`] and the sweep moves on.
//!
//! The mark only happens after a successful send, so a reminder is never
//! lost to a transient failure. If marking fails after the send, the next
//! sweep sends it again.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};
use zoomzone_core::{BookingPatch, SweepFailure, SweepReport, SweepStage, select_due};
use zoomzone_providers::{BookingStore, Notifier};

use crate::error::BookingError;
use crate::notify::MessageTemplates;

/// Provider name reported when the booking store cannot be read.
const BOOKING_STORE: &str = "booking_store";

#[derive(Clone)]
pub struct ReminderSweeper {
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    templates: MessageTemplates,
    lookahead: Duration,
}

impl ReminderSweeper {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        templates: MessageTemplates,
        lookahead: Duration,
    ) -> Self {
        Self {
            bookings,
            notifier,
            templates,
            lookahead,
        }
    }

    pub fn lookahead(&self) -> Duration {
        self.lookahead
    }

    /// Runs one sweep as of `now`.
    ///
    /// Only an unreadable booking store fails the sweep as a whole.
    #[instrument(skip(self))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, BookingError> {
        let bookings = self.bookings.list_all().await.map_err(|e| {
            warn!(error = %e, "could not read bookings");
            BookingError::upstream(BOOKING_STORE, &e)
        })?;

        let due = select_due(&bookings, now, self.lookahead);
        debug!(total = bookings.len(), due = due.len(), "selected bookings to remind");

        let mut report = SweepReport::new(now);
        for booking in due {
            let message = self.templates.reminder(booking);
            if let Err(e) = self.notifier.send(message).await {
                warn!(booking_id = %booking.id, error = %e, "reminder not sent");
                report.failed.push(SweepFailure {
                    booking_id: booking.id.clone(),
                    stage: SweepStage::Send,
                    error: e.to_string(),
                });
                continue;
            }

            match self.bookings.update(&booking.id, BookingPatch::reminder_sent()).await {
                Ok(()) => report.sent.push(booking.id.clone()),
                Err(e) => {
                    warn!(booking_id = %booking.id, error = %e, "reminder sent but not marked");
                    report.failed.push(SweepFailure {
                        booking_id: booking.id.clone(),
                        stage: SweepStage::MarkSent,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            sent = report.sent.len(),
            failed = report.failed.len(),
            "reminder sweep finished"
        );
        Ok(report)
    }
}
