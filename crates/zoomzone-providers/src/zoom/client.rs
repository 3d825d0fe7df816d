//! Zoom REST API client.

use base64::Engine;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::credentials::{IntegrationCredential, ZOOM};
use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::provider::{MeetingResource, NewMeeting};

/// Zoom meeting type for a one-off scheduled meeting.
const SCHEDULED_MEETING: u8 = 2;

/// Body error codes Zoom uses for expired or invalid access tokens.
const TOKEN_ERROR_CODES: [i64; 2] = [124, 1241];

/// Zoom API client.
#[derive(Debug, Clone)]
pub struct ZoomClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl ZoomClient {
    pub fn new(http_client: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Schedules a meeting on the authorizing user's account.
    pub async fn create_meeting(
        &self,
        access_token: &str,
        meeting: &NewMeeting,
    ) -> ProviderResult<MeetingResource> {
        let body = CreateMeetingBody {
            topic: &meeting.topic,
            kind: SCHEDULED_MEETING,
            start_time: meeting.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            duration: meeting.duration_minutes,
        };

        let response = self
            .http_client
            .post(format!("{}/users/me/meetings", self.api_base))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(http::transport_error)?;

        let created: CreateMeetingResponse =
            http::read_json_with(response, token_error_in_body).await?;
        Ok(MeetingResource {
            id: created.id.map(|id| match id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            join_url: created.join_url,
        })
    }
}

/// Zoom sometimes reports a dead token as a 400 with an error code in the
/// body instead of a 401.
fn token_error_in_body(_status: reqwest::StatusCode, body: &str) -> Option<ProviderError> {
    let code = serde_json::from_str::<ZoomErrorBody>(body).ok()?.code?;
    TOKEN_ERROR_CODES.contains(&code).then(|| {
        ProviderError::authentication(format!("zoom rejected the access token (code {code})"))
    })
}

/// Exchanges a refresh token. Zoom rotates refresh tokens on every use.
pub(crate) async fn refresh_token(
    http_client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> ProviderResult<IntegrationCredential> {
    let response = http_client
        .post(token_url)
        .header(
            reqwest::header::AUTHORIZATION,
            basic_auth_header(client_id, client_secret),
        )
        .query(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .map_err(http::transport_error)?;

    let token: TokenResponse = http::read_json(response).await.map_err(|e| {
        if e.code().is_retryable() {
            e
        } else {
            ProviderError::authentication(format!("token refresh failed: {}", e.message()))
        }
    })?;

    info!(provider = ZOOM, "refreshed access token");
    let refresh = token
        .refresh_token
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| refresh_token.to_string());
    Ok(IntegrationCredential::new(ZOOM, token.access_token)
        .with_refresh_token(refresh)
        .with_expires_in(token.expires_in))
}

fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("{client_id}:{client_secret}"));
    format!("Basic {encoded}")
}

#[derive(Debug, Serialize)]
struct CreateMeetingBody<'a> {
    topic: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    start_time: String,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct CreateMeetingResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
    join_url: String,
}

#[derive(Debug, Deserialize)]
struct ZoomErrorBody {
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
