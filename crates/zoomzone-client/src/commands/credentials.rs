//! Credential commands.
//!
//! The OAuth consent flows run elsewhere; these commands put the resulting
//! tokens into the daemon's credential store and show what is there.

use std::fmt::Write as _;
use std::path::Path;

use tracing::info;
use zoomzone_providers::{CredentialStore, FileCredentialStore, IntegrationCredential};

use super::print_json;
use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Tokens as given on the command line, possibly secret references.
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenInput {
    /// Resolves secret references into a credential.
    pub fn resolve(&self) -> ClientResult<IntegrationCredential> {
        let access_token =
            secret::resolve_field("access_token", &self.access_token).map_err(ClientError::Config)?;
        let mut credential = IntegrationCredential::new(&self.provider, access_token)
            .with_expires_in(self.expires_in);
        if let Some(raw) = &self.refresh_token {
            let refresh_token =
                secret::resolve_field("refresh_token", raw).map_err(ClientError::Config)?;
            credential = credential.with_refresh_token(refresh_token);
        }
        Ok(credential)
    }
}

pub async fn set(store_path: &Path, input: TokenInput) -> ClientResult<()> {
    let credential = input.resolve()?;
    let store = FileCredentialStore::new(store_path);
    store.upsert(credential).await?;
    info!(provider = %input.provider, "credential stored");
    println!("Stored {} tokens in {}", input.provider, store_path.display());
    Ok(())
}

pub fn show(store_path: &Path, json: bool) -> ClientResult<()> {
    let credentials = FileCredentialStore::new(store_path).list()?;
    if json {
        let summaries: Vec<_> = credentials.iter().map(summary).collect();
        return print_json(&summaries);
    }
    print!("{}", render(&credentials));
    Ok(())
}

/// Credential metadata without the tokens.
fn summary(credential: &IntegrationCredential) -> serde_json::Value {
    serde_json::json!({
        "provider": credential.provider_id,
        "has_refresh_token": credential.can_refresh(),
        "expires_at": credential.expires_at,
        "expired": credential.is_expired(),
        "updated_at": credential.updated_at,
    })
}

pub fn render(credentials: &[IntegrationCredential]) -> String {
    if credentials.is_empty() {
        return "No credentials stored.\n".to_string();
    }
    let mut out = String::new();
    for credential in credentials {
        let expiry = match credential.expires_at {
            Some(at) if credential.is_expired() => format!("expired {}", at.format("%Y-%m-%d %H:%M UTC")),
            Some(at) => format!("expires {}", at.format("%Y-%m-%d %H:%M UTC")),
            None => "no expiry".to_string(),
        };
        let refresh = if credential.can_refresh() {
            "refreshable"
        } else {
            "no refresh token"
        };
        let _ = writeln!(out, "{:<8} {expiry}, {refresh}", credential.provider_id);
    }
    out
}
