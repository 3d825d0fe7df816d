//! Client and daemon configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/zoomzone/config.toml` by default. Every section is optional.
//!
//! Credential values (`client_id`, `client_secret`) support secret references:
//! - `pass::path/in/store`, resolved via `pass show`
//! - `env::VAR_NAME`, resolved from the environment
//! - plain text, used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zoomzone_core::{BusinessHours, BusinessZone, DEFAULT_REMINDER_LOOKAHEAD_MINUTES};
use zoomzone_server::{BookingSettings, NotifyConfig};

use crate::secret;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub business: BusinessSettings,

    /// Google Calendar settings. Without them the daemon reports every
    /// calendar read as unavailable.
    pub google: Option<GoogleSettings>,

    pub zoom: Option<ZoomSettings>,

    pub storage: StorageSettings,

    pub server: ServerSettings,
}

/// When and how meetings can be booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessSettings {
    /// IANA timezone name.
    pub timezone: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub default_duration_minutes: i64,
    /// Durations offered to participants. Advisory only: any positive
    /// duration is accepted.
    pub allowed_durations: Vec<u32>,
    pub reminder_lookahead_minutes: u32,
    /// Receives a notice for every booking.
    pub operator_email: Option<String>,
    pub product_name: String,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        let hours = BusinessHours::default();
        Self {
            timezone: zoomzone_core::time::DEFAULT_TIMEZONE.to_string(),
            start_hour: hours.start_hour(),
            end_hour: hours.end_hour(),
            default_duration_minutes: 15,
            allowed_durations: vec![15, 30, 45, 60],
            reminder_lookahead_minutes: DEFAULT_REMINDER_LOOKAHEAD_MINUTES,
            operator_email: None,
            product_name: NotifyConfig::default().product_name,
        }
    }
}

impl BusinessSettings {
    pub fn zone(&self) -> Result<BusinessZone, String> {
        BusinessZone::from_name(&self.timezone).map_err(|e| e.to_string())
    }

    pub fn hours(&self) -> Result<BusinessHours, String> {
        BusinessHours::new(self.start_hour, self.end_hour).map_err(|e| e.to_string())
    }

    /// Checks every business setting and builds the daemon's view of them.
    pub fn booking_settings(&self) -> Result<BookingSettings, String> {
        if self.reminder_lookahead_minutes == 0 {
            return Err("reminder_lookahead_minutes must be greater than zero".to_string());
        }
        if self.default_duration_minutes <= 0 {
            return Err("default_duration_minutes must be greater than zero".to_string());
        }

        let mut notify = NotifyConfig::default().with_product_name(&self.product_name);
        if let Some(email) = &self.operator_email {
            notify = notify.with_operator_email(email);
        }

        Ok(BookingSettings {
            zone: self.zone()?,
            hours: self.hours()?,
            reminder_lookahead: chrono::Duration::minutes(i64::from(
                self.reminder_lookahead_minutes,
            )),
            notify,
        })
    }
}

/// Google Calendar client settings. Tokens live in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub calendar_id: String,
    pub timeout_secs: Option<u64>,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            calendar_id: "primary".to_string(),
            timeout_secs: None,
        }
    }
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Resolves the client credentials and builds the provider configuration.
    pub fn to_provider_config(
        &self,
        zone: BusinessZone,
    ) -> Result<zoomzone_providers::google::GoogleConfig, String> {
        use zoomzone_providers::google::{GoogleConfig, OAuthCredentials};

        let (client_id, client_secret) =
            resolve_client("google", &self.client_id, &self.client_secret)?;
        let mut config = GoogleConfig::new(OAuthCredentials::new(client_id, client_secret))
            .with_calendar_id(&self.calendar_id)
            .with_zone(zone);
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

/// Zoom client settings. Tokens live in the credential store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[cfg(feature = "zoom")]
impl ZoomSettings {
    pub fn to_provider_config(&self) -> Result<zoomzone_providers::zoom::ZoomConfig, String> {
        use zoomzone_providers::zoom::ZoomConfig;

        let (client_id, client_secret) =
            resolve_client("zoom", &self.client_id, &self.client_secret)?;
        let mut config = ZoomConfig::new(client_id, client_secret);
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

/// Resolves a `[section]`'s `client_id` and `client_secret`.
fn resolve_client(
    section: &str,
    client_id: &Option<String>,
    client_secret: &Option<String>,
) -> Result<(String, String), String> {
    let raw_id = client_id
        .as_deref()
        .ok_or_else(|| format!("client_id is missing from [{section}] section in config.toml"))?;
    let raw_secret = client_secret.as_deref().ok_or_else(|| {
        format!("client_secret is missing from [{section}] section in config.toml")
    })?;
    Ok((
        secret::resolve_field("client_id", raw_id)?,
        secret::resolve_field("client_secret", raw_secret)?,
    ))
}

/// Where the daemon keeps its files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub credentials_path: Option<PathBuf>,
    pub bookings_path: Option<PathBuf>,
}

impl StorageSettings {
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| ClientConfig::default_data_dir().join("credentials.json"))
    }

    pub fn bookings_path(&self) -> PathBuf {
        self.bookings_path
            .clone()
            .unwrap_or_else(|| ClientConfig::default_data_dir().join("bookings.json"))
    }
}

/// Server/connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub socket_path: Option<PathBuf>,

    /// Client request timeout in seconds. A booking waits on both remote
    /// services before it answers.
    pub timeout: u64,

    pub sweep_interval_secs: u64,

    /// When false, reminders only go out on `zoomzone sweep`.
    pub sweep_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout: 30,
            sweep_interval_secs: 300,
            sweep_enabled: true,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if there is
    /// no file.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {e}"))
    }

    /// Checks the business settings, the provider sections that are
    /// present, and the sweep interval.
    pub fn validate(&self) -> Result<(), String> {
        let settings = self
            .business
            .booking_settings()
            .map_err(|e| format!("[business] {e}"))?;

        #[cfg(feature = "google")]
        if let Some(google) = &self.google {
            google
                .to_provider_config(settings.zone)
                .map_err(|e| format!("[google] {e}"))?;
        }
        #[cfg(feature = "zoom")]
        if let Some(zoom) = &self.zoom {
            zoom.to_provider_config().map_err(|e| format!("[zoom] {e}"))?;
        }
        #[cfg(not(feature = "google"))]
        let _ = settings;

        if self.server.sweep_interval_secs == 0 {
            return Err("[server] sweep_interval_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zoomzone")
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zoomzone")
    }
}
