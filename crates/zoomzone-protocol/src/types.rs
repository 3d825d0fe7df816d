//! Request and response types for the zoomzone protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zoomzone_core::{BookingConfirmation, BookingRequest, Slot, SweepReport};

use crate::PROTOCOL_VERSION;

/// Message envelope wrapping all protocol messages.
///
/// Every message exchanged between client and server is wrapped in this envelope
/// which provides versioning and request correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Protocol version (always "1" for v1).
    pub protocol_version: String,
    /// Unique request ID for correlation.
    pub request_id: String,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(request_id: impl Into<String>, payload: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            request_id: request_id.into(),
            payload,
        }
    }

    pub fn request(request_id: impl Into<String>, request: T) -> Self {
        Self::new(request_id, request)
    }

    pub fn response(request_id: impl Into<String>, response: T) -> Self {
        Self::new(request_id, response)
    }

    /// Checks if this envelope uses a compatible protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// Requests a client can send to the booking daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Annotated slot list for a local date and meeting length.
    GetSlots {
        /// Local date, `YYYY-MM-DD`.
        date: String,
        duration_minutes: i64,
    },

    /// Book a meeting.
    SubmitBooking {
        #[serde(flatten)]
        booking: BookingRequest,
    },

    /// Run a reminder sweep now.
    RunSweep,

    Status,

    Shutdown,

    Ping,
}

impl Request {
    pub fn get_slots(date: impl Into<String>, duration_minutes: i64) -> Self {
        Self::GetSlots {
            date: date.into(),
            duration_minutes,
        }
    }

    pub fn submit_booking(booking: BookingRequest) -> Self {
        Self::SubmitBooking { booking }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetSlots { .. } => "get_slots",
            Self::SubmitBooking { .. } => "submit_booking",
            Self::RunSweep => "run_sweep",
            Self::Status => "status",
            Self::Shutdown => "shutdown",
            Self::Ping => "ping",
        }
    }
}

/// Responses sent from the daemon back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Slots {
        date: String,
        slots: Vec<Slot>,
    },

    BookingConfirmed {
        #[serde(flatten)]
        confirmation: BookingConfirmation,
    },

    SweepReport {
        #[serde(flatten)]
        report: SweepReport,
    },

    Status {
        #[serde(flatten)]
        info: StatusInfo,
    },

    Ok,

    Error {
        #[serde(flatten)]
        error: ErrorResponse,
    },

    Pong,
}

impl Response {
    pub fn slots(date: impl Into<String>, slots: Vec<Slot>) -> Self {
        Self::Slots {
            date: date.into(),
            slots,
        }
    }

    pub fn confirmed(confirmation: BookingConfirmation) -> Self {
        Self::BookingConfirmed { confirmation }
    }

    pub fn sweep_report(report: SweepReport) -> Self {
        Self::SweepReport { report }
    }

    pub fn status(info: StatusInfo) -> Self {
        Self::Status { info }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorResponse::new(code, message),
        }
    }

    pub fn from_error(error: ErrorResponse) -> Self {
        Self::Error { error }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    pub fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Daemon status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub uptime_seconds: u64,

    /// IANA name of the business timezone.
    pub timezone: String,

    pub bookings_submitted: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sweep: Option<SweepSummary>,

    /// Whether periodic sweeps are currently paused.
    #[serde(default)]
    pub sweeps_paused: bool,
}

impl StatusInfo {
    pub fn new(uptime_seconds: u64, timezone: impl Into<String>) -> Self {
        Self {
            uptime_seconds,
            timezone: timezone.into(),
            bookings_submitted: 0,
            last_sweep: None,
            sweeps_paused: false,
        }
    }

    pub fn with_bookings_submitted(mut self, count: u64) -> Self {
        self.bookings_submitted = count;
        self
    }

    pub fn with_last_sweep(mut self, summary: SweepSummary) -> Self {
        self.last_sweep = Some(summary);
        self
    }

    pub fn with_sweeps_paused(mut self, paused: bool) -> Self {
        self.sweeps_paused = paused;
        self
    }
}

/// Counts from the most recent sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub ran_at: DateTime<Utc>,
    pub sent: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepSummary {
    pub fn from_report(report: &SweepReport) -> Self {
        Self {
            ran_at: report.ran_at,
            sent: report.sent.len(),
            failed: report.failed.len(),
            error: None,
        }
    }

    pub fn aborted(ran_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            ran_at,
            sent: 0,
            failed: 0,
            error: Some(error.into()),
        }
    }
}

/// Error codes carried by [`Response::Error`].
///
/// The first four mirror the booking error taxonomy one to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Caller-fixable input problem.
    InvalidInput,
    /// The slot is taken; fetch availability again.
    SlotConflict,
    /// A third-party service failed; retry later.
    UpstreamUnavailable,
    /// A remote side effect happened but the booking did not complete.
    PartialBookingFailure,
    /// Malformed or unsupported protocol message.
    InvalidRequest,
    InternalError,
    ShuttingDown,
}

impl ErrorCode {
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid input",
            Self::SlotConflict => "The selected time is no longer available",
            Self::UpstreamUnavailable => "An external service is unavailable",
            Self::PartialBookingFailure => "Booking partially completed and needs manual attention",
            Self::InvalidRequest => "The request was invalid",
            Self::InternalError => "An internal error occurred",
            Self::ShuttingDown => "Server is shutting down",
        }
    }
}

/// Extra context for errors an operator may need to act on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Booking step that failed, e.g. `create_calendar_event`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Meeting left behind by a partial failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    /// External provider involved, e.g. `google` or `zoom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Conflicting interval for slot conflicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use zoomzone_core::{BookingId, SweepFailure, SweepStage};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    mod requests {
        use super::*;

        #[test]
        fn get_slots_wire_shape() {
            let json = serde_json::to_value(Request::get_slots("2024-06-10", 30)).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "type": "get_slots",
                    "date": "2024-06-10",
                    "duration_minutes": 30
                })
            );
        }

        #[test]
        fn submit_booking_is_flat() {
            let json = r#"{
                "type": "submit_booking",
                "name": "Ada",
                "email": "ada@example.com",
                "date": "2024-06-10",
                "time": "08:00",
                "duration_minutes": 15
            }"#;
            let request: Request = serde_json::from_str(json).unwrap();
            match request {
                Request::SubmitBooking { booking } => {
                    assert_eq!(booking.name, "Ada");
                    assert_eq!(booking.time, "08:00");
                    assert_eq!(booking.duration_minutes, 15);
                }
                other => panic!("unexpected request {other:?}"),
            }
        }

        #[test]
        fn unit_requests() {
            for (request, tag) in [
                (Request::RunSweep, "run_sweep"),
                (Request::Status, "status"),
                (Request::Ping, "ping"),
                (Request::Shutdown, "shutdown"),
            ] {
                let json = serde_json::to_value(&request).unwrap();
                assert_eq!(json["type"], tag);
                assert_eq!(request.kind(), tag);
            }
        }

        #[test]
        fn unknown_type_is_rejected() {
            let parsed: Result<Request, _> = serde_json::from_str(r#"{"type":"get_meetings"}"#);
            assert!(parsed.is_err());
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn partial_failure_carries_meeting_link() {
            let response = Response::from_error(
                ErrorResponse::new(ErrorCode::PartialBookingFailure, "calendar event failed")
                    .with_details(ErrorDetails {
                        stage: Some("create_calendar_event".into()),
                        meeting_link: Some("https://zoom.us/j/42".into()),
                        ..Default::default()
                    }),
            );
            let json = serde_json::to_value(&response).unwrap();
            assert_eq!(json["type"], "error");
            assert_eq!(json["code"], "partial_booking_failure");
            assert_eq!(json["details"]["meeting_link"], "https://zoom.us/j/42");
            assert!(json["details"].get("calendar_event_id").is_none());

            let parsed: Response = serde_json::from_value(json).unwrap();
            assert_eq!(parsed, response);
            assert!(!parsed.is_success());
        }

        #[test]
        fn sweep_report_lists_ids() {
            let mut report = SweepReport::new(utc(2024, 6, 10, 13, 10));
            report.sent.push(BookingId::from("b-1"));
            report.failed.push(SweepFailure {
                booking_id: BookingId::from("b-2"),
                stage: SweepStage::Send,
                error: "smtp down".into(),
            });
            let json = serde_json::to_value(Response::sweep_report(report)).unwrap();
            assert_eq!(json["type"], "sweep_report");
            assert_eq!(json["sent"], serde_json::json!(["b-1"]));
            assert_eq!(json["failed"][0]["stage"], "send");
        }

        #[test]
        fn status_summary() {
            let report = SweepReport::new(utc(2024, 6, 10, 13, 10));
            let info = StatusInfo::new(42, "America/Denver")
                .with_bookings_submitted(3)
                .with_last_sweep(SweepSummary::from_report(&report));
            let json = serde_json::to_value(Response::status(info.clone())).unwrap();
            assert_eq!(json["type"], "status");
            assert_eq!(json["bookings_submitted"], 3);
            assert_eq!(json["last_sweep"]["sent"], 0);

            let parsed: Response = serde_json::from_value(json).unwrap();
            assert_eq!(parsed, Response::status(info));
        }

        #[test]
        fn error_display_uses_description() {
            let err = ErrorResponse::new(ErrorCode::SlotConflict, "14:00 is taken");
            assert_eq!(
                err.to_string(),
                "The selected time is no longer available: 14:00 is taken"
            );
        }
    }

    #[test]
    fn envelope_version_check() {
        let envelope = Envelope::request("req-1", Request::Ping);
        assert!(envelope.is_compatible());

        let mut old = envelope.clone();
        old.protocol_version = "0".into();
        assert!(!old.is_compatible());
    }
}
