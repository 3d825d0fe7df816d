//! Calendar and meeting provider traits.
//!
//! Providers are stateless with respect to credentials: every call receives
//! the access token to use, and [`TokenRefresher::refresh_token`] exchanges
//! a refresh token for a new [`IntegrationCredential`]. Fetching, refreshing
//! and persisting credentials is the caller's job (see
//! [`crate::retry::call_with_refresh`]).

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zoomzone_core::TimeInterval;

use crate::credentials::IntegrationCredential;
use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Exchanges refresh tokens for fresh access tokens.
pub trait TokenRefresher: Send + Sync {
    /// Provider id the credentials of this provider are stored under.
    fn provider_id(&self) -> &str;

    /// Returns a credential with a new access token. Providers that do not
    /// rotate refresh tokens keep the one passed in.
    fn refresh_token(
        &self,
        refresh_token: String,
    ) -> BoxFuture<'_, ProviderResult<IntegrationCredential>>;
}

/// A calendar event to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Attendee email addresses.
    pub attendees: Vec<String>,
    pub description: String,
}

/// Reference to a created calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

/// The calendar that owns busy time and receives booked events.
pub trait CalendarProvider: TokenRefresher {
    /// Events overlapping `window`, recurring events expanded.
    fn list_events(
        &self,
        access_token: String,
        window: TimeInterval,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>>;

    fn create_event(
        &self,
        access_token: String,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<CreatedEvent>>;
}

/// A video meeting to schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeeting {
    pub topic: String,
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
}

/// A scheduled video meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub join_url: String,
}

/// The video-meeting service.
pub trait MeetingProvider: TokenRefresher {
    fn create_meeting(
        &self,
        access_token: String,
        meeting: NewMeeting,
    ) -> BoxFuture<'_, ProviderResult<MeetingResource>>;
}

/// Stand-in for a provider whose configuration is missing or invalid.
///
/// Every call fails with the configuration error, so the daemon can start
/// and report the problem per request instead of refusing to run.
#[derive(Debug)]
pub struct UnconfiguredProvider {
    provider_id: String,
    error: ProviderError,
}

impl UnconfiguredProvider {
    pub fn new(provider_id: impl Into<String>, error: ProviderError) -> Self {
        Self {
            provider_id: provider_id.into(),
            error,
        }
    }

    fn fail<T: Send + 'static>(&self) -> BoxFuture<'_, ProviderResult<T>> {
        let error = ProviderError::new(self.error.code(), self.error.message())
            .with_provider(&self.provider_id);
        Box::pin(async move { Err(error) })
    }
}

impl TokenRefresher for UnconfiguredProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn refresh_token(
        &self,
        _refresh_token: String,
    ) -> BoxFuture<'_, ProviderResult<IntegrationCredential>> {
        self.fail()
    }
}

impl CalendarProvider for UnconfiguredProvider {
    fn list_events(
        &self,
        _access_token: String,
        _window: TimeInterval,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        self.fail()
    }

    fn create_event(
        &self,
        _access_token: String,
        _event: NewCalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<CreatedEvent>> {
        self.fail()
    }
}

impl MeetingProvider for UnconfiguredProvider {
    fn create_meeting(
        &self,
        _access_token: String,
        _meeting: NewMeeting,
    ) -> BoxFuture<'_, ProviderResult<MeetingResource>> {
        self.fail()
    }
}
