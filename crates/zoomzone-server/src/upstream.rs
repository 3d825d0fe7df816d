//! Credentialed calls to external providers.
//!
//! [`Upstream`] ties the credential store to the refresh policy: it loads
//! the stored credential for a provider, runs the call through
//! [`call_with_refresh`], and writes a refreshed credential back before the
//! retry happens.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};
use zoomzone_providers::{
    CredentialStore, IntegrationCredential, ProviderError, ProviderResult, TokenRefresher,
    call_with_refresh,
};

#[derive(Clone)]
pub struct Upstream {
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream").finish_non_exhaustive()
    }
}

impl Upstream {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Runs `call` with the provider's stored access token, refreshing at
    /// most once.
    pub async fn call<R, T, F, Fut>(&self, provider: &R, call: F) -> ProviderResult<T>
    where
        R: TokenRefresher + ?Sized,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let provider_id = provider.provider_id().to_string();
        let mut credential = self
            .credentials
            .get(&provider_id)
            .await
            .map_err(|e| e.with_provider(&provider_id))?;

        let store = &self.credentials;
        let refresh = |current: IntegrationCredential| async move {
            let refresh_token = current.refresh_token.clone().ok_or_else(|| {
                ProviderError::authentication("no refresh token stored")
                    .with_provider(&current.provider_id)
            })?;
            debug!(provider = %current.provider_id, "refreshing credential");
            let fresh = provider.refresh_token(refresh_token).await?;
            store.upsert(fresh.clone()).await?;
            info!(provider = %fresh.provider_id, "stored refreshed credential");
            Ok(fresh)
        };

        call_with_refresh(&mut credential, call, refresh, ProviderError::needs_refresh).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMeetings;
    use zoomzone_providers::{MemoryCredentialStore, MeetingProvider, NewMeeting};

    fn meeting() -> NewMeeting {
        NewMeeting {
            topic: "Meeting with Ada".into(),
            start: chrono::Utc::now(),
            duration_minutes: 15,
        }
    }

    #[tokio::test]
    async fn refreshed_credential_is_persisted_before_retry() {
        let store = Arc::new(MemoryCredentialStore::with_credential(
            IntegrationCredential::new("zoom", "stale").with_refresh_token("rt"),
        ));
        let upstream = Upstream::new(store.clone());
        let zoom = FakeMeetings::new().reject_token("stale");

        let created = upstream
            .call(&zoom, |token| zoom.create_meeting(token, meeting()))
            .await
            .unwrap();
        assert!(created.join_url.starts_with("https://"));
        assert_eq!(zoom.refresh_count(), 1);
        assert_eq!(zoom.tokens_seen(), ["stale", "zoom-fresh-1"]);
        assert_eq!(store.get("zoom").await.unwrap().access_token, "zoom-fresh-1");
    }

    #[tokio::test]
    async fn missing_credential_is_not_found() {
        let upstream = Upstream::new(Arc::new(MemoryCredentialStore::new()));
        let zoom = FakeMeetings::new();
        let err = upstream
            .call(&zoom, |token| zoom.create_meeting(token, meeting()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.provider(), Some("zoom"));
        assert_eq!(zoom.refresh_count(), 0);
    }
}
