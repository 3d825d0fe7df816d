//! Server command: runs the booking daemon in the foreground.
//!
//! Wires together:
//! - the Google Calendar and Zoom providers from config
//! - the file-backed credential and booking stores
//! - the signal handler (SIGTERM/SIGINT)
//! - the reminder sweep scheduler
//! - the socket server

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use zoomzone_providers::{
    CalendarProvider, FileBookingStore, FileCredentialStore, GOOGLE, LogNotifier, MeetingProvider,
    ProviderError, UnconfiguredProvider, ZOOM,
};
use zoomzone_server::{
    BookingService, Collaborators, RequestHandler, Scheduler, SchedulerConfig, ServerConfig,
    SignalHandler, SocketServer, make_connection_handler, new_shared_state,
};

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Runs the daemon until SIGTERM/SIGINT or a client's shutdown request.
pub async fn run(cli: &Cli, config: &ClientConfig) -> ClientResult<()> {
    let settings = config
        .business
        .booking_settings()
        .map_err(|e| ClientError::Config(format!("[business] {e}")))?;
    if config.server.sweep_interval_secs == 0 {
        return Err(ClientError::Config(
            "[server] sweep_interval_secs must be greater than zero".into(),
        ));
    }

    let credentials_path = config.storage.credentials_path();
    let bookings_path = config.storage.bookings_path();
    info!(
        timezone = settings.zone.name(),
        credentials = %credentials_path.display(),
        bookings = %bookings_path.display(),
        "starting booking daemon"
    );

    let collaborators = Collaborators {
        calendar: build_calendar(config, &settings)?,
        meetings: build_meetings(config)?,
        credentials: Arc::new(FileCredentialStore::new(credentials_path)),
        bookings: Arc::new(FileBookingStore::new(bookings_path)),
        notifier: Arc::new(LogNotifier),
    };
    let service = BookingService::new(settings, collaborators);

    let signal_handler = SignalHandler::new();
    signal_handler
        .spawn_listener()
        .map_err(|e| ClientError::Config(format!("failed to install signal handlers: {e}")))?;

    let state = new_shared_state();

    let sweep_enabled = config.server.sweep_enabled;
    let scheduler = Scheduler::new(
        SchedulerConfig::new(Duration::from_secs(config.server.sweep_interval_secs))
            .with_sweep_on_start(sweep_enabled),
    );
    let scheduler_handle = scheduler.handle();
    state
        .write()
        .await
        .set_scheduler_handle(scheduler_handle.clone());

    let sweep_service = service.clone();
    let scheduler_task = tokio::spawn(scheduler.run(move |now| {
        let service = sweep_service.clone();
        async move { service.sweep(now).await }
    }));
    if !sweep_enabled {
        info!("timed reminder sweeps disabled; sweeps run on request only");
        if let Err(e) = scheduler_handle.pause().await {
            warn!(error = %e, "failed to pause sweep scheduler");
        }
    }

    let socket_path = cli
        .socket_path
        .clone()
        .or_else(|| config.server.socket_path.clone())
        .unwrap_or_else(zoomzone_server::default_socket_path);
    let server = SocketServer::new(ServerConfig::new(&socket_path))
        .await
        .map_err(|e| ClientError::Config(format!("failed to start socket server: {e}")))?;
    info!(path = %socket_path.display(), "server listening");

    let handler = RequestHandler::new(state, service)
        .with_shutdown_handle(signal_handler.shutdown_handle());

    server
        .run_until_shutdown(make_connection_handler(handler), signal_handler.shutdown().wait())
        .await
        .map_err(|e| ClientError::Config(format!("server error: {e}")))?;

    info!("shutting down");
    if let Err(e) = scheduler_handle.stop().await {
        warn!(error = %e, "failed to stop sweep scheduler");
    }
    if tokio::time::timeout(Duration::from_secs(5), scheduler_task)
        .await
        .is_err()
    {
        warn!("sweep scheduler did not stop in time");
    }

    info!("server stopped");
    Ok(())
}

fn unconfigured(provider_id: &str, section: &str) -> UnconfiguredProvider {
    warn!(
        provider = provider_id,
        "no [{section}] section in config; calls to {provider_id} will fail"
    );
    UnconfiguredProvider::new(
        provider_id,
        ProviderError::configuration(format!("no [{section}] section in config.toml")),
    )
}

fn build_calendar(
    config: &ClientConfig,
    settings: &zoomzone_server::BookingSettings,
) -> ClientResult<Arc<dyn CalendarProvider>> {
    #[cfg(feature = "google")]
    if let Some(google) = &config.google {
        let provider_config = google
            .to_provider_config(settings.zone)
            .map_err(|e| ClientError::Config(format!("[google] {e}")))?;
        let provider = zoomzone_providers::google::GoogleProvider::new(provider_config)?;
        info!(calendar = %google.calendar_id, "Google Calendar provider initialized");
        return Ok(Arc::new(provider));
    }
    #[cfg(not(feature = "google"))]
    let _ = (config, settings);

    Ok(Arc::new(unconfigured(GOOGLE, "google")))
}

fn build_meetings(config: &ClientConfig) -> ClientResult<Arc<dyn MeetingProvider>> {
    #[cfg(feature = "zoom")]
    if let Some(zoom) = &config.zoom {
        let provider_config = zoom
            .to_provider_config()
            .map_err(|e| ClientError::Config(format!("[zoom] {e}")))?;
        let provider = zoomzone_providers::zoom::ZoomProvider::new(provider_config)?;
        info!("Zoom provider initialized");
        return Ok(Arc::new(provider));
    }
    #[cfg(not(feature = "zoom"))]
    let _ = config;

    Ok(Arc::new(unconfigured(ZOOM, "zoom")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GoogleSettings, ZoomSettings};
    use zoomzone_providers::ProviderErrorCode;

    #[tokio::test]
    async fn missing_sections_become_unconfigured_providers() {
        let config = ClientConfig::default();
        let meetings = build_meetings(&config).unwrap();
        let err = meetings
            .create_meeting(
                "token".into(),
                zoomzone_providers::NewMeeting {
                    topic: "Meeting with Ada".into(),
                    start: chrono::Utc::now(),
                    duration_minutes: 30,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }

    #[test]
    fn invalid_sections_fail_startup() {
        let config = ClientConfig {
            google: Some(GoogleSettings::default()),
            zoom: Some(ZoomSettings::default()),
            ..Default::default()
        };
        let settings = config.business.booking_settings().unwrap();
        assert!(matches!(build_calendar(&config, &settings), Err(ClientError::Config(_))));
        assert!(matches!(build_meetings(&config), Err(ClientError::Config(_))));
    }
}
