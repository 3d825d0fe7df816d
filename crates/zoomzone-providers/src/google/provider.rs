//! Google Calendar provider implementation.
//!
//! Implements [`CalendarProvider`] on top of [`GoogleCalendarClient`]. The
//! provider holds no tokens; callers pass them in.

use tracing::{debug, instrument};
use zoomzone_core::TimeInterval;

use crate::credentials::{GOOGLE, IntegrationCredential};
use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::provider::{
    BoxFuture, CalendarProvider, CreatedEvent, NewCalendarEvent, TokenRefresher,
};
use crate::raw_event::RawEvent;

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth;

/// Google Calendar provider.
#[derive(Debug)]
pub struct GoogleProvider {
    config: GoogleConfig,
    http_client: reqwest::Client,
    api_client: GoogleCalendarClient,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;
        let http_client = http::build_client(config.timeout)?;
        let api_client = GoogleCalendarClient::new(http_client.clone(), &config.api_base);
        Ok(Self {
            config,
            http_client,
            api_client,
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    fn tag(err: ProviderError) -> ProviderError {
        err.with_provider(GOOGLE)
    }

    #[instrument(skip(self, access_token), fields(calendar = %self.config.calendar_id))]
    async fn list_events_impl(
        &self,
        access_token: String,
        window: TimeInterval,
    ) -> ProviderResult<Vec<RawEvent>> {
        let events = self
            .api_client
            .list_events(&access_token, &self.config.calendar_id, window)
            .await
            .map_err(Self::tag)?;
        debug!(count = events.len(), "listed calendar events");
        Ok(events)
    }

    #[instrument(skip(self, access_token, event), fields(calendar = %self.config.calendar_id))]
    async fn create_event_impl(
        &self,
        access_token: String,
        event: NewCalendarEvent,
    ) -> ProviderResult<CreatedEvent> {
        self.api_client
            .insert_event(
                &access_token,
                &self.config.calendar_id,
                &self.config.zone,
                &event,
            )
            .await
            .map_err(Self::tag)
    }
}

impl TokenRefresher for GoogleProvider {
    fn provider_id(&self) -> &str {
        GOOGLE
    }

    fn refresh_token(
        &self,
        refresh_token: String,
    ) -> BoxFuture<'_, ProviderResult<IntegrationCredential>> {
        Box::pin(async move {
            oauth::refresh_token(
                &self.http_client,
                &self.config.token_url,
                &self.config.credentials,
                &refresh_token,
            )
            .await
            .map_err(Self::tag)
        })
    }
}

impl CalendarProvider for GoogleProvider {
    fn list_events(
        &self,
        access_token: String,
        window: TimeInterval,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        Box::pin(self.list_events_impl(access_token, window))
    }

    fn create_event(
        &self,
        access_token: String,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<CreatedEvent>> {
        Box::pin(self.create_event_impl(access_token, event))
    }
}
