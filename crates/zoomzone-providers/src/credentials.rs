//! Integration credentials and where they are kept.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::json_file;
use crate::provider::BoxFuture;

/// Provider id of the Google Calendar integration.
pub const GOOGLE: &str = "google";
/// Provider id of the Zoom integration.
pub const ZOOM: &str = "zoom";

/// Tokens are treated as expired this long before their stated expiry.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// OAuth tokens for one external provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationCredential {
    pub provider_id: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

// Tokens stay out of logs.
impl fmt::Debug for IntegrationCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationCredential")
            .field("provider_id", &self.provider_id)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl IntegrationCredential {
    pub fn new(provider_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets the expiry from an OAuth `expires_in` lifetime.
    pub fn with_expires_in(mut self, expires_in_secs: Option<i64>) -> Self {
        self.expires_at = expires_in_secs.map(|secs| self.updated_at + Duration::seconds(secs));
        self
    }

    /// True once `now` is within the expiry buffer. Credentials without a
    /// known expiry are assumed valid until a provider rejects them.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now + Duration::seconds(EXPIRY_BUFFER_SECS) >= expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Persistent home of integration credentials, keyed by provider id.
pub trait CredentialStore: Send + Sync {
    /// Fails with a not-found error when nothing is stored for `provider_id`.
    fn get<'a>(
        &'a self,
        provider_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<IntegrationCredential>>;

    fn upsert(&self, credential: IntegrationCredential) -> BoxFuture<'_, ProviderResult<()>>;
}

fn missing(provider_id: &str) -> ProviderError {
    ProviderError::not_found(format!("no stored credential for '{provider_id}'"))
        .with_provider(provider_id)
}

type CredentialMap = BTreeMap<String, IntegrationCredential>;

/// Credentials kept in a JSON file, re-read on every access so tokens
/// written by another process are picked up.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored credentials, for display.
    pub fn list(&self) -> ProviderResult<Vec<IntegrationCredential>> {
        let map: CredentialMap = json_file::read_or_default(&self.path)?;
        Ok(map.into_values().collect())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get<'a>(
        &'a self,
        provider_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<IntegrationCredential>> {
        Box::pin(async move {
            let mut map: CredentialMap = json_file::read_or_default(&self.path)?;
            map.remove(provider_id).ok_or_else(|| missing(provider_id))
        })
    }

    fn upsert(&self, credential: IntegrationCredential) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut map: CredentialMap = json_file::read_or_default(&self.path)?;
            let provider_id = credential.provider_id.clone();
            map.insert(provider_id.clone(), credential);
            json_file::write_atomic(&self.path, &map)?;
            info!(provider = %provider_id, path = %self.path.display(), "stored credential");
            Ok(())
        })
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<CredentialMap>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: IntegrationCredential) -> Self {
        Self::with_credentials([credential])
    }

    pub fn with_credentials(credentials: impl IntoIterator<Item = IntegrationCredential>) -> Self {
        let map = credentials
            .into_iter()
            .map(|c| (c.provider_id.clone(), c))
            .collect::<CredentialMap>();
        Self {
            credentials: Mutex::new(map),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get<'a>(
        &'a self,
        provider_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<IntegrationCredential>> {
        Box::pin(async move {
            self.credentials
                .lock()
                .await
                .get(provider_id)
                .cloned()
                .ok_or_else(|| missing(provider_id))
        })
    }

    fn upsert(&self, credential: IntegrationCredential) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            debug!(provider = %credential.provider_id, "stored credential in memory");
            self.credentials
                .lock()
                .await
                .insert(credential.provider_id.clone(), credential);
            Ok(())
        })
    }
}
