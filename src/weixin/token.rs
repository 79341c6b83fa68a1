//! Access-token cache.
//!
//! Holds at most one [`Credential`]. A token is served from the cache while
//! it is outside the safety margin of its expiry; otherwise a new one is
//! fetched from `/cgi-bin/token`. Concurrent refreshes may both hit the
//! platform; the credential record is swapped whole under the write lock, so
//! the last writer wins and readers never see a partial record.

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::client::PlatformClient;
use crate::config::Config;
use crate::errors::PublishError;
use crate::models::Credential;

/// Token lifetime assumed when the platform omits `expires_in`.
const DEFAULT_EXPIRES_IN: u64 = 7200;

#[derive(Debug, Deserialize)]
struct TokenReply {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

pub struct CredentialCache {
    client: PlatformClient,
    app_id: Option<String>,
    app_secret: Option<Zeroizing<String>>,
    current: RwLock<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(client: PlatformClient, app_id: Option<String>, app_secret: Option<String>) -> Self {
        Self {
            client,
            app_id: app_id.filter(|v| !v.trim().is_empty()),
            app_secret: app_secret
                .filter(|v| !v.trim().is_empty())
                .map(Zeroizing::new),
            current: RwLock::new(None),
        }
    }

    pub fn from_config(client: PlatformClient, config: &Config) -> Self {
        Self::new(client, config.app_id.clone(), config.app_secret.clone())
    }

    /// Checks that both halves of the app identity are configured.
    pub fn identity(&self) -> Result<(&str, &str), PublishError> {
        match (self.app_id.as_deref(), self.app_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret.as_str())),
            _ => Err(PublishError::configuration(
                "Weixin configuration incomplete: set both WEIXIN_APP_ID and WEIXIN_APP_SECRET",
            )),
        }
    }

    /// Returns a usable access token, refreshing it when needed.
    pub async fn get_token(&self) -> Result<String, PublishError> {
        if let Some(cred) = self.current.read().await.as_ref() {
            if cred.is_usable() {
                return Ok(cred.token().to_string());
            }
            debug!(expires_at = %cred.expires_at(), "cached access token is near expiry");
        }

        let cred = self.refresh().await?;
        Ok(cred.token().to_string())
    }

    /// Fetches a fresh token unconditionally and caches it.
    pub async fn refresh(&self) -> Result<Credential, PublishError> {
        let (app_id, app_secret) = self.identity()?;

        let reply: TokenReply = self
            .client
            .get(
                "/cgi-bin/token",
                &[
                    ("grant_type", "client_credential"),
                    ("appid", app_id),
                    ("secret", app_secret),
                ],
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "access token request failed");
                e.into_auth_error()
            })?;

        let token = match reply.access_token {
            Some(t) if !t.is_empty() => t,
            _ => {
                warn!("token endpoint replied without an access_token");
                return Err(PublishError::authentication(
                    "token endpoint replied without an access_token",
                ));
            }
        };

        let cred = Credential::new(token, reply.expires_in.unwrap_or(DEFAULT_EXPIRES_IN));
        info!(
            expires_in = cred.expires_in(),
            expires_at = %cred.expires_at(),
            "refreshed platform access token"
        );

        *self.current.write().await = Some(cred.clone());
        Ok(cred)
    }

    /// Replaces the cached credential.
    pub async fn store(&self, cred: Credential) {
        *self.current.write().await = Some(cred);
    }

    pub async fn current(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PlatformClient {
        // Nothing listens here; any network attempt fails fast.
        PlatformClient::new("http://127.0.0.1:9").unwrap()
    }

    #[tokio::test]
    async fn test_missing_identity_fails_before_network() {
        let cache = CredentialCache::new(client(), Some("wx123".into()), None);
        let err = cache.get_token().await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_blank_identity_counts_as_missing() {
        let cache = CredentialCache::new(client(), Some("  ".into()), Some("secret".into()));
        assert!(cache.identity().is_err());
    }

    #[tokio::test]
    async fn test_usable_cached_token_served_without_identity_check() {
        let cache = CredentialCache::new(client(), None, None);
        cache.store(Credential::new("cached", 7200)).await;
        assert_eq!(cache.get_token().await.unwrap(), "cached");
    }

    #[tokio::test]
    async fn test_transport_failure_is_authentication_error() {
        let cache = CredentialCache::new(client(), Some("wx".into()), Some("secret".into()));
        let err = cache.get_token().await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Authentication);
        assert!(!err.detail().contains("secret="));
    }
}
