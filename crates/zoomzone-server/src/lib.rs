//! Booking daemon: slot availability, the booking transaction and
//! reminder sweeps, served over a Unix socket.
//!
//! [`BookingService`] composes the collaborators; [`RequestHandler`] answers
//! protocol requests with it; [`Scheduler`] runs reminder sweeps one at a
//! time.
//!
//! # Example
//!
//! ```rust,no_run
//! use zoomzone_server::{
//!     BookingService, BookingSettings, Collaborators, RequestHandler, ServerConfig,
//!     SocketServer, make_connection_handler, new_shared_state,
//! };
//!
//! async fn serve(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//!     let service = BookingService::new(BookingSettings::default(), collaborators);
//!     let handler = RequestHandler::new(new_shared_state(), service);
//!     let server = SocketServer::new(ServerConfig::default()).await?;
//!     server.run(make_connection_handler(handler)).await?;
//!     Ok(())
//! }
//! ```

mod availability;
mod busy;
mod config;
mod error;
mod handler;
mod notify;
mod orchestrator;
mod scheduler;
mod service;
mod signals;
mod socket;
mod sweeper;
mod upstream;

#[cfg(test)]
mod testing;

pub use availability::AvailabilityService;
pub use busy::BusyIntervalSource;
pub use config::{ServerConfig, default_socket_path};
pub use error::{BookingError, BookingStage, ServerError, ServerResult};
pub use handler::{
    RequestHandler, ServerState, SharedState, make_connection_handler, new_shared_state,
};
pub use notify::{MessageTemplates, NotifyConfig};
pub use orchestrator::{BookingOrchestrator, OrchestratorParts};
pub use scheduler::{
    Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SchedulerStopped, SharedSchedulerState, SweepResult, new_scheduler_state,
};
pub use service::{BookingService, BookingSettings, Collaborators};
pub use signals::{ShutdownHandle, ShutdownSignal, SignalHandler};
pub use socket::{Connection, SocketServer};
pub use sweeper::ReminderSweeper;
pub use upstream::Upstream;
