//! IPC framing and request/response types for the zoomzone booking daemon.
//!
//! Messages are length-prefixed JSON (4-byte big-endian length, then the
//! payload), each wrapped in an [`Envelope`] carrying the protocol version
//! and a request id for correlation.
//!
//! ```rust
//! use zoomzone_protocol::{Envelope, Request, encode_message, decode_message};
//!
//! let request = Envelope::request("req-123", Request::get_slots("2024-06-10", 30));
//! let bytes = encode_message(&request).unwrap();
//! let decoded: Envelope<Request> = decode_message(&bytes).unwrap();
//! assert_eq!(decoded, request);
//! ```

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{HEADER_LEN, decode_message, decode_payload, encode_message, payload_length};
pub use types::{
    Envelope, ErrorCode, ErrorDetails, ErrorResponse, Request, Response, StatusInfo, SweepSummary,
};

/// Protocol version constant.
pub const PROTOCOL_VERSION: &str = "1";

/// Maximum message size (1 MB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;
