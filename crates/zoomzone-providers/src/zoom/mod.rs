//! Zoom meeting provider.
//!
//! Schedules one-off meetings on the authorizing user's account. Tokens
//! come from the credential store under the `zoom` provider id; Zoom
//! rotates the refresh token on every refresh.

mod client;
mod config;
mod provider;

pub use client::ZoomClient;
pub use config::{ZOOM_API_BASE, ZOOM_TOKEN_URL, ZoomConfig};
pub use provider::ZoomProvider;
