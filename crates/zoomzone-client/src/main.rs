//! zoomzone CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::Level;

use zoomzone_client::cli::{Cli, Command, ConfigAction, CredentialsAction};
use zoomzone_client::commands::{booking, config as config_cmd, credentials, server, status};
use zoomzone_client::config::ClientConfig;
use zoomzone_client::error::{ClientError, ClientResult};
use zoomzone_client::socket::SocketClient;
use zoomzone_core::tracing::{TracingConfig, TracingOutputFormat, init_tracing};
use zoomzone_core::BookingRequest;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = match (&cli.command, cli.debug) {
        (Command::Server, false) => TracingConfig::daemon(),
        (Command::Server, true) => TracingConfig::daemon().with_level(Level::DEBUG),
        (_, true) => TracingConfig::cli_debug(),
        (_, false) => TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Compact),
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    match &cli.command {
        Command::Slots { date, duration } => {
            let duration = duration.unwrap_or(config.business.default_duration_minutes);
            booking::slots(&client(&cli, &config), date, duration, cli.json).await
        }
        Command::Book {
            name,
            email,
            date,
            time,
            duration,
        } => {
            let request = BookingRequest {
                name: name.clone(),
                email: email.clone(),
                date: date.clone(),
                time: time.clone(),
                duration_minutes: duration.unwrap_or(config.business.default_duration_minutes),
            };
            let zone = config.business.zone().map_err(ClientError::Config)?;
            booking::book(&client(&cli, &config), request, zone, cli.json).await
        }
        Command::Sweep => booking::sweep(&client(&cli, &config), cli.json).await,
        Command::Status => status::run(&client(&cli, &config), cli.json).await,
        Command::Server => server::run(&cli, &config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => config_cmd::dump(&config, &config_path),
            ConfigAction::Validate => config_cmd::validate(&config),
            ConfigAction::Path => config_cmd::path(&config, &config_path),
        },
        Command::Credentials { action } => {
            let store_path = config.storage.credentials_path();
            match action {
                CredentialsAction::Set {
                    provider,
                    access_token,
                    refresh_token,
                    expires_in,
                } => {
                    let input = credentials::TokenInput {
                        provider: provider.clone(),
                        access_token: access_token.clone(),
                        refresh_token: refresh_token.clone(),
                        expires_in: *expires_in,
                    };
                    credentials::set(&store_path, input).await
                }
                CredentialsAction::Show => credentials::show(&store_path, cli.json),
            }
        }
    }
}

fn client(cli: &Cli, config: &ClientConfig) -> SocketClient {
    let socket_path: PathBuf = cli
        .socket_path
        .clone()
        .or_else(|| config.server.socket_path.clone())
        .unwrap_or_else(zoomzone_server::default_socket_path);
    let timeout = cli.timeout.unwrap_or(config.server.timeout);
    SocketClient::new(socket_path, Duration::from_secs(timeout))
}
