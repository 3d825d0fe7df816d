//! Unix socket client for the zoomzone daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, warn};
use uuid::Uuid;

use zoomzone_protocol::{
    Envelope, HEADER_LEN, Request, Response, decode_payload, encode_message, payload_length,
};

use crate::error::{ClientError, ClientResult};

pub struct SocketClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl SocketClient {
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            zoomzone_server::default_socket_path(),
            Duration::from_secs(5),
        )
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Sends a request and waits for the response.
    pub async fn send(&self, request: Request) -> ClientResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        let envelope = Envelope::request(&request_id, request);

        debug!(
            socket = %self.socket_path.display(),
            request_id = %request_id,
            request_type = envelope.payload.kind(),
            "connecting to server"
        );

        let stream = tokio::time::timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| {
                ClientError::Connection(format!(
                    "connection timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                ClientError::Connection(format!(
                    "failed to connect to {}: {e} (is `zoomzone server` running?)",
                    self.socket_path.display()
                ))
            })?;

        let response = self.exchange(stream, &envelope).await?;

        if response.request_id != request_id {
            warn!(
                expected = %request_id,
                received = %response.request_id,
                "response request_id mismatch"
            );
        }

        Ok(response.payload)
    }

    /// Like [`send`](Self::send), turning an error response into
    /// [`ClientError::Server`].
    pub async fn request(&self, request: Request) -> ClientResult<Response> {
        match self.send(request).await? {
            Response::Error { error } => Err(ClientError::Server(error)),
            response => Ok(response),
        }
    }

    async fn exchange(
        &self,
        mut stream: UnixStream,
        envelope: &Envelope<Request>,
    ) -> ClientResult<Envelope<Response>> {
        let frame = encode_message(envelope)?;

        tokio::time::timeout(self.timeout, async {
            stream.write_all(&frame).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| ClientError::Timeout("sending request".into()))??;

        debug!("request sent, waiting for response");

        let mut header = [0u8; HEADER_LEN];
        tokio::time::timeout(self.timeout, stream.read_exact(&mut header))
            .await
            .map_err(|_| ClientError::Timeout("reading response".into()))??;

        let mut payload = vec![0u8; payload_length(header)?];
        tokio::time::timeout(self.timeout, stream.read_exact(&mut payload))
            .await
            .map_err(|_| ClientError::Timeout("reading response".into()))??;

        let envelope: Envelope<Response> = decode_payload(&payload)?;
        debug!(request_id = %envelope.request_id, "response received");
        Ok(envelope)
    }

    /// True when a daemon answers on the socket.
    pub async fn ping(&self) -> bool {
        matches!(self.send(Request::Ping).await, Ok(Response::Pong))
    }
}
