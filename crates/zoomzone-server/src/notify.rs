//! Notification messages for bookings and reminders.
//!
//! The templates render times in the business zone with its abbreviation,
//! so a participant reads the same wall-clock time the slot list showed.

use zoomzone_core::{Booking, BusinessZone};
use zoomzone_providers::OutgoingMessage;

/// Who gets told about bookings, and how the product signs its messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Name used in subjects and sign-offs.
    pub product_name: String,
    /// Receives a notice for every new booking. No notice is sent when unset.
    pub operator_email: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            product_name: "Zoom Zone".to_string(),
            operator_email: None,
        }
    }
}

impl NotifyConfig {
    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into();
        self
    }

    pub fn with_operator_email(mut self, email: impl Into<String>) -> Self {
        self.operator_email = Some(email.into());
        self
    }
}

/// Builds the three message kinds from a booking.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    config: NotifyConfig,
    zone: BusinessZone,
}

impl MessageTemplates {
    pub fn new(config: NotifyConfig, zone: BusinessZone) -> Self {
        Self { config, zone }
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Confirmation sent to the person who booked.
    pub fn participant_confirmation(&self, booking: &Booking) -> OutgoingMessage {
        let when = self.zone.display(booking.start);
        let body = format!(
            "Hi {name},\n\n\
             Your meeting is scheduled for {when} and will last {duration} minutes.\n\n\
             Join Zoom meeting: {link}\n\n\
             Thanks,\n{product}\n",
            name = booking.name,
            duration = booking.duration_minutes,
            link = booking.meeting_link,
            product = self.config.product_name,
        );
        OutgoingMessage::new(
            &booking.email,
            format!("Your {} Meeting - {when}", self.config.product_name),
            body,
        )
    }

    /// Notice for the operator, if one is configured.
    pub fn operator_notice(&self, booking: &Booking) -> Option<OutgoingMessage> {
        let operator = self.config.operator_email.as_deref()?;
        let when = self.zone.display(booking.start);
        let body = format!(
            "New meeting booked by {name} ({email}).\n\n\
             Scheduled for {when} for {duration} minutes.\n\n\
             Zoom link: {link}\n",
            name = booking.name,
            email = booking.email,
            duration = booking.duration_minutes,
            link = booking.meeting_link,
        );
        Some(OutgoingMessage::new(
            operator,
            format!("New Booking - {when}"),
            body,
        ))
    }

    pub fn reminder(&self, booking: &Booking) -> OutgoingMessage {
        let when = self.zone.display(booking.start);
        let body = format!(
            "Hi {name},\n\n\
             This is a reminder for your meeting at {when}.\n\n\
             Zoom link: {link}\n\n\
             - {product}\n",
            name = booking.name,
            link = booking.meeting_link,
            product = self.config.product_name,
        );
        OutgoingMessage::new(&booking.email, format!("Meeting Reminder - {when}"), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use zoomzone_core::BookingId;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, h, m, 0).unwrap()
    }

    fn booking() -> Booking {
        Booking {
            id: BookingId::from("b-1"),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            start: utc(20, 0),
            end: utc(20, 30),
            duration_minutes: 30,
            meeting_link: "https://zoom.us/j/42".into(),
            calendar_event_id: Some("evt-1".into()),
            created_at: utc(12, 0),
            reminder_sent: false,
        }
    }

    fn templates(config: NotifyConfig) -> MessageTemplates {
        MessageTemplates::new(config, BusinessZone::default())
    }

    #[test]
    fn participant_subject_uses_local_time() {
        let message = templates(NotifyConfig::default()).participant_confirmation(&booking());
        assert_eq!(message.to, "ada@example.com");
        assert_eq!(message.subject, "Your Zoom Zone Meeting - 2024-06-10 14:00 MDT");
        assert!(message.body.contains("https://zoom.us/j/42"));
        assert!(message.body.contains("30 minutes"));
    }

    #[test]
    fn operator_notice_needs_an_operator() {
        assert!(templates(NotifyConfig::default()).operator_notice(&booking()).is_none());

        let message = templates(NotifyConfig::default().with_operator_email("ops@example.com"))
            .operator_notice(&booking())
            .unwrap();
        assert_eq!(message.to, "ops@example.com");
        assert_eq!(message.subject, "New Booking - 2024-06-10 14:00 MDT");
        assert!(message.body.contains("Ada (ada@example.com)"));
    }

    #[test]
    fn reminder_is_signed_with_product() {
        let message = templates(NotifyConfig::default().with_product_name("Office Hours"))
            .reminder(&booking());
        assert_eq!(message.subject, "Meeting Reminder - 2024-06-10 14:00 MDT");
        assert!(message.body.ends_with("- Office Hours\n"));
    }
}
