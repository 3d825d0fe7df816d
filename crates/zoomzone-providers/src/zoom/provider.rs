//! Zoom meeting provider.

use tracing::{debug, instrument};

use crate::credentials::{IntegrationCredential, ZOOM};
use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::provider::{BoxFuture, MeetingProvider, MeetingResource, NewMeeting, TokenRefresher};

use super::client::{self, ZoomClient};
use super::config::ZoomConfig;

#[derive(Debug)]
pub struct ZoomProvider {
    config: ZoomConfig,
    http_client: reqwest::Client,
    api_client: ZoomClient,
}

impl ZoomProvider {
    pub fn new(config: ZoomConfig) -> ProviderResult<Self> {
        config.validate()?;
        let http_client = http::build_client(config.timeout)?;
        let api_client = ZoomClient::new(http_client.clone(), &config.api_base);
        Ok(Self {
            config,
            http_client,
            api_client,
        })
    }

    fn tag(err: ProviderError) -> ProviderError {
        err.with_provider(ZOOM)
    }

    #[instrument(skip(self, access_token), fields(topic = %meeting.topic))]
    async fn create_meeting_impl(
        &self,
        access_token: String,
        meeting: NewMeeting,
    ) -> ProviderResult<MeetingResource> {
        let created = self
            .api_client
            .create_meeting(&access_token, &meeting)
            .await
            .map_err(Self::tag)?;
        debug!(meeting_id = ?created.id, "created zoom meeting");
        Ok(created)
    }
}

impl TokenRefresher for ZoomProvider {
    fn provider_id(&self) -> &str {
        ZOOM
    }

    fn refresh_token(
        &self,
        refresh_token: String,
    ) -> BoxFuture<'_, ProviderResult<IntegrationCredential>> {
        Box::pin(async move {
            client::refresh_token(
                &self.http_client,
                &self.config.token_url,
                &self.config.client_id,
                &self.config.client_secret,
                &refresh_token,
            )
            .await
            .map_err(Self::tag)
        })
    }
}

impl MeetingProvider for ZoomProvider {
    fn create_meeting(
        &self,
        access_token: String,
        meeting: NewMeeting,
    ) -> BoxFuture<'_, ProviderResult<MeetingResource>> {
        Box::pin(self.create_meeting_impl(access_token, meeting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn invalid_config_is_rejected() {
        assert!(ZoomProvider::new(ZoomConfig::new("", "")).is_err());
    }

    #[tokio::test]
    async fn errors_carry_provider_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = ZoomProvider::new(
            ZoomConfig::new("id", "secret")
                .with_endpoints(server.uri(), format!("{}/oauth/token", server.uri())),
        )
        .unwrap();
        assert_eq!(provider.provider_id(), ZOOM);

        let err = provider
            .create_meeting(
                "tok".into(),
                NewMeeting {
                    topic: "Meeting with Ada".into(),
                    start: Utc.with_ymd_and_hms(2024, 6, 10, 14, 0, 0).unwrap(),
                    duration_minutes: 15,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.provider(), Some(ZOOM));

        let err = provider.refresh_token("rt".into()).await.unwrap_err();
        assert_eq!(err.provider(), Some(ZOOM));
    }
}
