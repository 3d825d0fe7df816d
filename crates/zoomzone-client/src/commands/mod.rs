//! Subcommand implementations.

pub mod booking;
pub mod config;
pub mod credentials;
pub mod server;
pub mod status;

use serde::Serialize;

use crate::error::{ClientError, ClientResult};

/// Prints `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> ClientResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ClientError::Protocol(format!("failed to render JSON: {e}")))?;
    println!("{text}");
    Ok(())
}
