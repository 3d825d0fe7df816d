//! The call-with-credential-refresh policy.
//!
//! Every credentialed call goes through [`call_with_refresh`]: at most one
//! token refresh per invocation, and at most one retry of the call.

use std::future::Future;

use tracing::{debug, warn};

use crate::credentials::IntegrationCredential;
use crate::error::{ProviderError, ProviderResult};

/// Runs `call` with the credential's access token.
///
/// * If the credential is already known to be expired and can be refreshed,
///   it is refreshed before the first attempt.
/// * Otherwise, if the call fails and `needs_refresh` classifies the error
///   as an expired token, the credential is refreshed once and the call is
///   retried once.
///
/// `refresh` is responsible for persisting the new credential. On success
/// `credential` holds whatever token the final call used. A failed refresh
/// or a failing retry is returned as-is.
pub async fn call_with_refresh<T, Call, CallFut, Refresh, RefreshFut, Classify>(
    credential: &mut IntegrationCredential,
    mut call: Call,
    refresh: Refresh,
    needs_refresh: Classify,
) -> ProviderResult<T>
where
    Call: FnMut(String) -> CallFut,
    CallFut: Future<Output = ProviderResult<T>>,
    Refresh: FnOnce(IntegrationCredential) -> RefreshFut,
    RefreshFut: Future<Output = ProviderResult<IntegrationCredential>>,
    Classify: Fn(&ProviderError) -> bool,
{
    let mut refresh = Some(refresh);

    if credential.is_expired()
        && credential.can_refresh()
        && let Some(refresh) = refresh.take()
    {
        debug!(provider = %credential.provider_id, "credential expired, refreshing first");
        *credential = refresh(credential.clone()).await?;
    }

    match call(credential.access_token.clone()).await {
        Err(err) if needs_refresh(&err) => {
            let Some(refresh) = refresh.take() else {
                return Err(err);
            };
            if !credential.can_refresh() {
                warn!(provider = %credential.provider_id, "token rejected and no refresh token stored");
                return Err(err);
            }
            debug!(provider = %credential.provider_id, error = %err, "token rejected, refreshing");
            *credential = refresh(credential.clone()).await?;
            call(credential.access_token.clone()).await
        }
        other => other,
    }
}
