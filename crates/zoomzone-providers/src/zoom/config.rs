//! Zoom provider configuration.

use std::fmt;
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

/// Base URL for the Zoom REST API v2.
pub const ZOOM_API_BASE: &str = "https://api.zoom.us/v2";
/// Zoom's OAuth token endpoint.
pub const ZOOM_TOKEN_URL: &str = "https://zoom.us/oauth/token";

#[derive(Clone)]
pub struct ZoomConfig {
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
    pub api_base: String,
    pub token_url: String,
}

impl fmt::Debug for ZoomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoomConfig")
            .field("client_id", &self.client_id)
            .field("timeout", &self.timeout)
            .field("api_base", &self.api_base)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl ZoomConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            api_base: ZOOM_API_BASE.to_string(),
            token_url: ZOOM_TOKEN_URL.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_endpoints(
        mut self,
        api_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.token_url = token_url.into();
        self
    }

    pub fn validate(&self) -> ProviderResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(ProviderError::configuration("zoom: client_id is required"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ProviderError::configuration(
                "zoom: client_secret is required",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ProviderError::configuration(
                "zoom: timeout must be greater than zero",
            ));
        }
        for endpoint in [&self.api_base, &self.token_url] {
            url::Url::parse(endpoint).map_err(|e| {
                ProviderError::configuration(format!("zoom: invalid endpoint '{endpoint}': {e}"))
            })?;
        }
        Ok(())
    }
}
