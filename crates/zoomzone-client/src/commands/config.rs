//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {e}")))?;
    println!("# config.toml ({})", path.display());
    println!("{toml_str}");
    Ok(())
}

pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;
    if config.google.is_none() {
        println!("warning: no [google] section; availability reads will fail");
    }
    if config.zoom.is_none() {
        println!("warning: no [zoom] section; bookings will fail");
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show where configuration and data live.
pub fn path(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    println!("config:      {}", path.display());
    println!("credentials: {}", config.storage.credentials_path().display());
    println!("bookings:    {}", config.storage.bookings_path().display());
    Ok(())
}
