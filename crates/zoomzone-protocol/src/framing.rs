//! Length-prefixed message framing for IPC.
//!
//! ```text
//! +----------------+------------------+
//! | length (4 BE)  |  JSON payload    |
//! +----------------+------------------+
//! ```
//!
//! Socket code reads the 4-byte header, validates it with
//! [`payload_length`], reads that many bytes and hands them to
//! [`decode_payload`].

use serde::{Serialize, de::DeserializeOwned};

use crate::MAX_MESSAGE_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

/// Size of the length prefix in bytes.
pub const HEADER_LEN: usize = 4;

/// Serializes `message` and prepends its length.
pub fn encode_message<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let json = serde_json::to_vec(message)?;
    let len = u32::try_from(json.len()).map_err(|_| ProtocolError::MessageTooLarge {
        size: u32::MAX,
        max: MAX_MESSAGE_SIZE,
    })?;

    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buffer = Vec::with_capacity(HEADER_LEN + json.len());
    buffer.extend_from_slice(&len.to_be_bytes());
    buffer.extend_from_slice(&json);
    Ok(buffer)
}

/// Validates a length prefix and returns the payload size it announces.
pub fn payload_length(header: [u8; HEADER_LEN]) -> ProtocolResult<usize> {
    let len = u32::from_be_bytes(header);
    if len == 0 {
        return Err(ProtocolError::EmptyMessage);
    }
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(len as usize)
}

/// Decodes a JSON payload (without its length prefix).
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> ProtocolResult<T> {
    Ok(serde_json::from_slice(payload)?)
}

/// Decodes a complete frame: length prefix followed by the payload.
pub fn decode_message<T: DeserializeOwned>(data: &[u8]) -> ProtocolResult<T> {
    let Some((header, rest)) = data.split_first_chunk::<HEADER_LEN>() else {
        return Err(ProtocolError::IncompleteMessage {
            expected: HEADER_LEN,
            received: data.len(),
        });
    };

    let len = payload_length(*header)?;
    if rest.len() < len {
        return Err(ProtocolError::IncompleteMessage {
            expected: HEADER_LEN + len,
            received: data.len(),
        });
    }

    decode_payload(&rest[..len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Envelope, Request, Response};

    #[test]
    fn frame_carries_payload_length() {
        let envelope = Envelope::request("req-123", Request::get_slots("2024-06-10", 30));
        let bytes = encode_message(&envelope).unwrap();

        let header: [u8; HEADER_LEN] = bytes[..HEADER_LEN].try_into().unwrap();
        assert_eq!(payload_length(header).unwrap(), bytes.len() - HEADER_LEN);

        let decoded: Envelope<Request> = decode_message(&bytes).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn header_and_payload_decode_separately() {
        let envelope = Envelope::response("req-1", Response::Pong);
        let bytes = encode_message(&envelope).unwrap();
        let decoded: Envelope<Response> = decode_payload(&bytes[HEADER_LEN..]).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn short_header_is_incomplete() {
        let result: ProtocolResult<Envelope<Request>> = decode_message(&[0, 0]);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage { expected: 4, received: 2 })
        ));
    }

    #[test]
    fn truncated_payload_is_incomplete() {
        let mut data = vec![0, 0, 0, 100];
        data.extend_from_slice(&[0u8; 10]);

        let result: ProtocolResult<Envelope<Request>> = decode_message(&data);
        assert!(matches!(
            result,
            Err(ProtocolError::IncompleteMessage { expected: 104, .. })
        ));
    }

    #[test]
    fn oversized_and_empty_headers_are_rejected() {
        let huge = (MAX_MESSAGE_SIZE + 1).to_be_bytes();
        assert!(matches!(
            payload_length(huge),
            Err(ProtocolError::MessageTooLarge { .. })
        ));
        assert!(matches!(
            payload_length([0, 0, 0, 0]),
            Err(ProtocolError::EmptyMessage)
        ));
    }

    #[test]
    fn invalid_json_payload() {
        let result: ProtocolResult<Envelope<Request>> = decode_payload(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Serialization(_))));
    }
}
