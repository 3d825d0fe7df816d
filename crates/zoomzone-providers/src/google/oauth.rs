//! Google OAuth token refresh.
//!
//! The interactive consent flow happens outside this program; only the
//! refresh-token grant is implemented here.

use serde::Deserialize;
use tracing::info;

use crate::credentials::{GOOGLE, IntegrationCredential};
use crate::error::{ProviderError, ProviderResult};
use crate::http;

use super::config::OAuthCredentials;

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges a refresh token for a new access token.
///
/// Google usually omits the refresh token from the response; the one that
/// was sent is kept in that case.
pub(crate) async fn refresh_token(
    http_client: &reqwest::Client,
    token_url: &str,
    credentials: &OAuthCredentials,
    refresh_token: &str,
) -> ProviderResult<IntegrationCredential> {
    let params = [
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let response = http_client
        .post(token_url)
        .form(&params)
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

    info!(provider = GOOGLE, "refreshed access token");
    Ok(IntegrationCredential::new(GOOGLE, token.access_token)
        .with_refresh_token(
            token
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| refresh_token.to_string()),
        )
        .with_expires_in(token.expires_in))
}
