//! Client error types.

use thiserror::Error;
use zoomzone_protocol::{ErrorCode, ErrorResponse};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The daemon answered with an error.
    #[error("{0}")]
    Server(ErrorResponse),

    /// The daemon answered with a response of the wrong kind.
    #[error("unexpected response from server: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// Process exit status for this error.
    ///
    /// Booking failures get their own statuses so scripts can tell a
    /// taken slot from an outage.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Server(response) => match response.code {
                ErrorCode::InvalidInput => 2,
                ErrorCode::SlotConflict => 3,
                ErrorCode::UpstreamUnavailable => 4,
                ErrorCode::PartialBookingFailure => 5,
                _ => 1,
            },
            _ => 1,
        }
    }
}

impl From<zoomzone_providers::ProviderError> for ClientError {
    fn from(err: zoomzone_providers::ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<zoomzone_protocol::ProtocolError> for ClientError {
    fn from(err: zoomzone_protocol::ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}
