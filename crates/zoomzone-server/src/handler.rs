//! Request handling for the booking daemon.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zoomzone_protocol::{
    Envelope, ErrorCode, ErrorResponse, PROTOCOL_VERSION, Request, Response, StatusInfo,
};

use crate::error::{ServerError, ServerResult};
use crate::scheduler::SchedulerHandle;
use crate::service::BookingService;
use crate::signals::ShutdownHandle;
use crate::socket::Connection;

/// Daemon-wide counters and handles shared by every connection.
#[derive(Debug)]
pub struct ServerState {
    start_time: Instant,
    bookings_submitted: u64,
    shutdown_requested: bool,
    scheduler_handle: Option<SchedulerHandle>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            bookings_submitted: 0,
            shutdown_requested: false,
            scheduler_handle: None,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn record_booking(&mut self) {
        self.bookings_submitted += 1;
    }

    pub fn bookings_submitted(&self) -> u64 {
        self.bookings_submitted
    }

    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Sweeps requested by clients go through this handle.
    pub fn set_scheduler_handle(&mut self, handle: SchedulerHandle) {
        self.scheduler_handle = Some(handle);
    }

    pub fn scheduler_handle(&self) -> Option<&SchedulerHandle> {
        self.scheduler_handle.as_ref()
    }
}

pub type SharedState = Arc<RwLock<ServerState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(RwLock::new(ServerState::new()))
}

/// Turns requests into responses.
#[derive(Clone)]
pub struct RequestHandler {
    state: SharedState,
    service: BookingService,
    shutdown: Option<ShutdownHandle>,
}

impl RequestHandler {
    pub fn new(state: SharedState, service: BookingService) -> Self {
        Self {
            state,
            service,
            shutdown: None,
        }
    }

    /// A `Shutdown` request triggers `handle` as well as flagging the state.
    pub fn with_shutdown_handle(mut self, handle: ShutdownHandle) -> Self {
        self.shutdown = Some(handle);
        self
    }

    /// Answers a request envelope, rejecting other protocol versions.
    pub async fn handle_envelope(&self, envelope: &Envelope<Request>) -> Response {
        if !envelope.is_compatible() {
            warn!(
                version = %envelope.protocol_version,
                "rejecting request with unsupported protocol version"
            );
            return Response::from_error(ErrorResponse::invalid_request(format!(
                "unsupported protocol version {:?}, expected {PROTOCOL_VERSION:?}",
                envelope.protocol_version
            )));
        }
        self.handle(&envelope.payload).await
    }

    #[tracing::instrument(skip(self, request), fields(request_type = request.kind(), duration_ms))]
    pub async fn handle(&self, request: &Request) -> Response {
        let start = Instant::now();

        let response = match request {
            Request::Ping => Response::Pong,
            Request::Status => self.status().await,
            Request::GetSlots {
                date,
                duration_minutes,
            } => match self.service.slots(date, *duration_minutes, Utc::now()).await {
                Ok(slots) => {
                    debug!(slot_count = slots.len(), "returning slots");
                    Response::slots(date.clone(), slots)
                }
                Err(e) => Response::from_error(e.to_response()),
            },
            Request::SubmitBooking { booking } => {
                match self.service.book(booking, Utc::now()).await {
                    Ok(confirmation) => {
                        self.state.write().await.record_booking();
                        Response::confirmed(confirmation)
                    }
                    Err(e) => {
                        warn!(code = ?e.code(), error = %e, "booking failed");
                        Response::from_error(e.to_response())
                    }
                }
            }
            Request::RunSweep => self.run_sweep().await,
            Request::Shutdown => {
                info!("shutdown requested by client");
                self.state.write().await.request_shutdown();
                if let Some(handle) = &self.shutdown {
                    handle.trigger();
                }
                Response::Ok
            }
        };

        let duration = start.elapsed();
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::Span::current().record("duration_ms", duration.as_millis());
            debug!(duration_ms = duration.as_millis(), "request handled");
        }
        response
    }

    async fn status(&self) -> Response {
        let (uptime, bookings, scheduler) = {
            let state = self.state.read().await;
            (
                state.uptime_seconds(),
                state.bookings_submitted(),
                state.scheduler_handle().cloned(),
            )
        };

        let mut info = StatusInfo::new(uptime, self.service.zone().name())
            .with_bookings_submitted(bookings);
        if let Some(handle) = scheduler {
            let scheduler = handle.state().await;
            info = info.with_sweeps_paused(scheduler.paused);
            if let Some(summary) = scheduler.last_sweep {
                info = info.with_last_sweep(summary);
            }
        }
        Response::status(info)
    }

    async fn run_sweep(&self) -> Response {
        let handle = self.state.read().await.scheduler_handle().cloned();
        let Some(handle) = handle else {
            return Response::error(
                ErrorCode::InternalError,
                "reminder sweeps are not running on this daemon",
            );
        };

        match handle.sweep_now().await {
            Ok(Ok(report)) => Response::sweep_report(report),
            Ok(Err(e)) => Response::from_error(e.to_response()),
            Err(stopped) => Response::error(ErrorCode::ShuttingDown, stopped.to_string()),
        }
    }

    /// Serves requests on `conn` until the client hangs up.
    ///
    /// Returns [`ServerError::Shutdown`] after answering a shutdown request.
    pub async fn handle_connection(&self, mut conn: Connection) -> ServerResult<()> {
        loop {
            match conn.read_request().await {
                Ok(Some(envelope)) => {
                    let response = self.handle_envelope(&envelope).await;
                    conn.respond(&envelope.request_id, response).await?;

                    if self.state.read().await.shutdown_requested() {
                        return Err(ServerError::Shutdown);
                    }
                }
                Ok(None) => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "error reading request");
                    return Err(e);
                }
            }
        }
    }
}

/// Creates a connection handler for [`SocketServer::run`](crate::SocketServer::run).
pub fn make_connection_handler(
    handler: RequestHandler,
) -> impl Fn(Connection) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
+ Send
+ Sync
+ 'static {
    move |conn| {
        let handler = handler.clone();
        Box::pin(async move {
            if let Err(e) = handler.handle_connection(conn).await
                && !matches!(e, ServerError::Shutdown)
            {
                warn!(error = %e, "connection handler error");
            }
        })
    }
}
