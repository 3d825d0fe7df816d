//! Shared HTTP plumbing for the REST providers.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderResult};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("zoomzone/", env!("CARGO_PKG_VERSION"));

/// Builds the client used by a provider.
pub(crate) fn build_client(timeout: Duration) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::configuration(format!("failed to create HTTP client: {e}")))
}

/// Maps a transport failure.
pub(crate) fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::network("request timeout")
    } else if err.is_connect() {
        ProviderError::network(format!("connection failed: {err}"))
    } else {
        ProviderError::network(format!("request failed: {err}"))
    }
    .with_source(err)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Maps a non-success HTTP status to a provider error.
pub(crate) fn status_error(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> ProviderError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    match status {
        StatusCode::UNAUTHORIZED => {
            ProviderError::authentication(format!("access token expired or invalid ({detail})"))
        }
        StatusCode::FORBIDDEN => ProviderError::authorization(format!("access denied ({detail})")),
        StatusCode::NOT_FOUND => ProviderError::not_found(detail),
        StatusCode::TOO_MANY_REQUESTS => {
            let err = ProviderError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|d| format!(", retry after {} seconds", d.as_secs()))
                    .unwrap_or_default()
            ));
            match retry_after {
                Some(after) => err.with_retry_after(after),
                None => err,
            }
        }
        s if s.is_client_error() => ProviderError::bad_request(detail),
        _ => ProviderError::server(format!("API error ({detail})")),
    }
}

/// Reads a response: JSON on success, a mapped error otherwise.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> ProviderResult<T> {
    read_json_with(response, |_, _| None).await
}

/// Like [`read_json`], but `inspect` may claim a failed response body
/// before the generic status mapping applies.
pub(crate) async fn read_json_with<T, F>(
    response: reqwest::Response,
    inspect: F,
) -> ProviderResult<T>
where
    T: DeserializeOwned,
    F: FnOnce(StatusCode, &str) -> Option<ProviderError>,
{
    let status = response.status();
    let after = retry_after(response.headers());
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(inspect(status, &body).unwrap_or_else(|| status_error(status, after, &body)));
    }

    serde_json::from_str(&body)
        .map_err(|e| ProviderError::invalid_response(format!("failed to parse response: {e}")))
}
