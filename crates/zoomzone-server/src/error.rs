//! Server error types.

use std::io;

use chrono::{DateTime, Utc};
use thiserror::Error;
use zoomzone_core::{InputError, TimeError, TimeInterval};
use zoomzone_protocol::{ErrorCode, ErrorDetails, ErrorResponse};
use zoomzone_providers::ProviderError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the daemon itself.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (socket, file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error (framing, encoding, etc.).
    #[error("Protocol error: {0}")]
    Protocol(#[from] zoomzone_protocol::ProtocolError),

    /// Socket path already in use.
    #[error("Socket path already in use: {path}")]
    SocketInUse { path: String },

    /// Socket path parent directory does not exist.
    #[error("Socket path parent directory does not exist: {path}")]
    SocketPathInvalid { path: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Shutdown requested.
    #[error("Server shutdown requested")]
    Shutdown,
}

impl ServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn socket_in_use(path: impl Into<String>) -> Self {
        Self::SocketInUse { path: path.into() }
    }

    pub fn socket_path_invalid(path: impl Into<String>) -> Self {
        Self::SocketPathInvalid { path: path.into() }
    }
}

/// Booking step that can leave an external side effect behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStage {
    CreateCalendarEvent,
    PersistBooking,
}

impl BookingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateCalendarEvent => "create_calendar_event",
            Self::PersistBooking => "persist_booking",
        }
    }
}

impl std::fmt::Display for BookingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing outcome of a failed booking, slot or sweep operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// The caller sent something unusable.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The slot is taken; fetch availability again and pick another.
    #[error("slot conflicts with an existing event from {start} to {end}")]
    SlotConflict {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A third party failed; retrying later may succeed.
    #[error("{provider} unavailable: {message}")]
    UpstreamUnavailable { provider: String, message: String },

    /// A meeting (and maybe a calendar event) exists but no booking was
    /// recorded. Needs manual reconciliation.
    #[error("booking incomplete at {stage}: {message} (meeting {meeting_link})")]
    PartialBookingFailure {
        stage: BookingStage,
        meeting_link: String,
        calendar_event_id: Option<String>,
        message: String,
    },
}

impl BookingError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn conflict(busy: &TimeInterval) -> Self {
        Self::SlotConflict {
            start: busy.start,
            end: busy.end,
        }
    }

    /// Wraps a collaborator failure. The provider name falls back to
    /// `fallback` when the error does not carry one.
    pub fn upstream(fallback: &str, err: &ProviderError) -> Self {
        Self::UpstreamUnavailable {
            provider: err.provider().unwrap_or(fallback).to_string(),
            message: err.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::SlotConflict { .. } => ErrorCode::SlotConflict,
            Self::UpstreamUnavailable { .. } => ErrorCode::UpstreamUnavailable,
            Self::PartialBookingFailure { .. } => ErrorCode::PartialBookingFailure,
        }
    }

    fn details(&self) -> Option<ErrorDetails> {
        match self {
            Self::InvalidInput { .. } => None,
            Self::SlotConflict { start, end } => Some(ErrorDetails {
                conflict_start: Some(*start),
                conflict_end: Some(*end),
                ..Default::default()
            }),
            Self::UpstreamUnavailable { provider, .. } => Some(ErrorDetails {
                provider: Some(provider.clone()),
                ..Default::default()
            }),
            Self::PartialBookingFailure {
                stage,
                meeting_link,
                calendar_event_id,
                ..
            } => Some(ErrorDetails {
                stage: Some(stage.to_string()),
                meeting_link: Some(meeting_link.clone()),
                calendar_event_id: calendar_event_id.clone(),
                ..Default::default()
            }),
        }
    }

    /// The protocol error sent back to clients.
    pub fn to_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.code(), self.to_string());
        match self.details() {
            Some(details) => response.with_details(details),
            None => response,
        }
    }
}

impl From<InputError> for BookingError {
    fn from(err: InputError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

impl From<TimeError> for BookingError {
    fn from(err: TimeError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, h, m, 0).unwrap()
    }

    #[test]
    fn conflict_carries_interval() {
        let busy = TimeInterval::new(utc(13, 50), utc(14, 5)).unwrap();
        let response = BookingError::conflict(&busy).to_response();
        assert_eq!(response.code, ErrorCode::SlotConflict);
        let details = response.details.unwrap();
        assert_eq!(details.conflict_start, Some(utc(13, 50)));
        assert_eq!(details.conflict_end, Some(utc(14, 5)));
    }

    #[test]
    fn partial_failure_keeps_meeting_link() {
        let err = BookingError::PartialBookingFailure {
            stage: BookingStage::CreateCalendarEvent,
            meeting_link: "https://zoom.us/j/1".into(),
            calendar_event_id: None,
            message: "server error".into(),
        };
        let response = err.to_response();
        assert_eq!(response.code, ErrorCode::PartialBookingFailure);
        let details = response.details.unwrap();
        assert_eq!(details.stage.as_deref(), Some("create_calendar_event"));
        assert_eq!(details.meeting_link.as_deref(), Some("https://zoom.us/j/1"));
    }

    #[test]
    fn upstream_prefers_provider_from_error() {
        let err = ProviderError::server("boom").with_provider("zoom");
        match BookingError::upstream("calendar", &err) {
            BookingError::UpstreamUnavailable { provider, .. } => assert_eq!(provider, "zoom"),
            other => panic!("unexpected {other:?}"),
        }
        match BookingError::upstream("google", &ProviderError::network("down")) {
            BookingError::UpstreamUnavailable { provider, .. } => assert_eq!(provider, "google"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn input_errors_are_invalid_input() {
        let err: BookingError = InputError::MissingField("name").into();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(err.to_response().details.is_none());
    }
}
