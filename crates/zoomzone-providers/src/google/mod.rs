//! Google Calendar provider.
//!
//! Reads busy time from one calendar (recurring events expanded by the
//! server) and inserts booked meetings into it, inviting the participant.
//!
//! # Authentication
//!
//! The consent flow runs outside this program; the operator stores the
//! resulting tokens under the `google` provider id. This module only
//! exchanges refresh tokens for new access tokens.
//!
//! # Example
//!
//! ```ignore
//! use zoomzone_providers::google::{GoogleConfig, GoogleProvider, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("client_secret.json")?;
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials))?;
//! let events = provider.list_events(access_token, window).await?;
//! ```

mod client;
mod config;
mod oauth;
mod provider;

pub use client::GoogleCalendarClient;
pub use config::{CALENDAR_API_BASE, GOOGLE_TOKEN_URL, GoogleConfig, OAuthCredentials};
pub use provider::GoogleProvider;
