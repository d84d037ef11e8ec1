//! OAuth token lifecycle management for the Zoho accounts server.
//!
//! This module provides `TokenManager`, which owns the cached access token
//! and its expiry instant, and exchanges the long-lived refresh token for a
//! new access token whenever the cache is absent or stale.
//!
//! # Caching
//!
//! A fetched access token is reused until a fixed safety margin before the
//! lifetime Zoho declared for it, so a token is never presented downstream
//! moments before it lapses. The cache lives behind an async mutex that is
//! held across the refresh exchange: concurrent callers that observe a stale
//! token await the single in-flight exchange rather than each issuing their
//! own.
//!
//! # Security
//!
//! The client secret and refresh token are never logged. Error messages
//! built from exchange responses are sanitized by the server layer before
//! they reach the caller.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::PrismError;

/// Safety margin subtracted from the provider-declared token lifetime.
///
/// A declared lifetime below this margin yields an expiry at or before the
/// refresh instant, making the token stale on the very next lookup. That
/// boundary is intentional and must not be clamped.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// A cached access token and the instant after which it is considered stale.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Token endpoint response.
///
/// Zoho reports failures as a 200 response carrying an `error` field, so
/// every field here is optional and checked explicitly.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

/// Manages the OAuth access-token lifecycle against the Zoho accounts server.
///
/// One instance is created at startup and shared by the request dispatcher.
/// Injecting it explicitly (rather than reading ambient global state) keeps
/// the refresh path testable with a mock accounts server.
pub struct TokenManager {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Full URL of the token endpoint.
    token_url: String,

    /// OAuth client identifier.
    client_id: String,

    /// OAuth client secret.
    /// SECURITY: Never log this value!
    client_secret: String,

    /// Long-lived refresh token, immutable for the process lifetime.
    /// SECURITY: Never log this value!
    refresh_token: String,

    /// Cached token state. Held across the refresh await so only one
    /// exchange is in flight per expiry window.
    cache: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    /// Creates a new token manager from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration containing the OAuth secrets and accounts URL
    /// * `http` - Shared HTTP client
    pub fn new(config: &Config, http: Client) -> Self {
        Self {
            http,
            token_url: format!("{}/oauth/v2/token", config.accounts_url),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            cache: Mutex::new(None),
        }
    }

    /// Returns a valid access token, refreshing it first if necessary.
    ///
    /// A cached token that has not reached its expiry instant is returned
    /// without any network call. Otherwise the refresh token is exchanged at
    /// the accounts server; on failure the cached state is cleared so the
    /// next call retries from scratch.
    ///
    /// # Errors
    ///
    /// Returns `PrismError::Authentication` when the exchange fails, carrying
    /// the provider's error string when one was supplied and the transport
    /// diagnostic otherwise.
    pub async fn access_token(&self) -> Result<String, PrismError> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if Instant::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
            tracing::debug!("cached access token is stale, refreshing");
        } else {
            tracing::debug!("no cached access token, refreshing");
        }

        match self.refresh().await {
            Ok(fresh) => {
                let token = fresh.access_token.clone();
                *cache = Some(fresh);
                Ok(token)
            }
            Err(e) => {
                // Drop the stale entry so the next invocation retries
                // cleanly instead of reusing known-bad state.
                *cache = None;
                Err(e)
            }
        }
    }

    /// Performs the refresh-token exchange against the accounts server.
    async fn refresh(&self) -> Result<CachedToken, PrismError> {
        let params = [
            ("refresh_token", self.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                PrismError::authentication(format!("token exchange request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PrismError::authentication(format!("failed to read token response: {}", e))
        })?;

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|_| {
            PrismError::authentication(format!(
                "malformed token response (HTTP {}): {}",
                status, body
            ))
        })?;

        // Zoho reports rejections in-band; check the error field before
        // anything else, regardless of HTTP status.
        if let Some(error) = parsed.error {
            return Err(PrismError::authentication(error));
        }

        match (parsed.access_token, parsed.expires_in) {
            (Some(access_token), Some(expires_in)) => {
                let now = Instant::now();
                tracing::debug!(expires_in, "access token refreshed");
                Ok(CachedToken {
                    access_token,
                    expires_at: Self::compute_expiry(now, expires_in),
                })
            }
            _ => Err(PrismError::authentication(format!(
                "token response missing access_token or expires_in (HTTP {})",
                status
            ))),
        }
    }

    /// Computes the expiry instant for a freshly issued token.
    ///
    /// Lifetimes below the safety margin produce an expiry at or before
    /// `now`; the resulting token is stale on the next lookup.
    fn compute_expiry(now: Instant, expires_in: u64) -> Instant {
        (now + Duration::from_secs(expires_in))
            .checked_sub(TOKEN_EXPIRY_MARGIN)
            .unwrap_or(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(accounts_url: &str) -> Config {
        Config {
            client_id: "1000.CLIENTID".to_string(),
            client_secret: "clientsecret".to_string(),
            refresh_token: "1000.refresh.token".to_string(),
            accounts_url: accounts_url.to_string(),
            desk_url: "https://desk.zoho.com/api/v1".to_string(),
        }
    }

    fn manager(accounts_url: &str) -> TokenManager {
        TokenManager::new(&test_config(accounts_url), Client::new())
    }

    fn token_response(access_token: &str, expires_in: u64) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": access_token,
            "expires_in": expires_in,
            "token_type": "Bearer",
        }))
    }

    #[tokio::test]
    async fn test_refresh_sends_expected_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=1000.refresh.token"))
            .and(body_string_contains("client_id=1000.CLIENTID"))
            .and(body_string_contains("client_secret=clientsecret"))
            .respond_with(token_response("tok-1", 3600))
            .expect(1)
            .mount(&server)
            .await;

        let mgr = manager(&server.uri());
        let token = mgr.access_token().await.unwrap();
        assert_eq!(token, "tok-1");
    }

    #[tokio::test]
    async fn test_cached_token_skips_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(token_response("tok-1", 3600))
            .expect(1)
            .mount(&server)
            .await;

        let mgr = manager(&server.uri());
        assert_eq!(mgr.access_token().await.unwrap(), "tok-1");
        // Second call must be served from the cache (expect(1) above).
        assert_eq!(mgr.access_token().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn test_lifetime_at_margin_is_immediately_stale() {
        let server = MockServer::start().await;
        // expires_in equal to the 300s margin puts the expiry at the
        // refresh instant, so every call refreshes again.
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(token_response("tok-short", 300))
            .expect(2)
            .mount(&server)
            .await;

        let mgr = manager(&server.uri());
        assert_eq!(mgr.access_token().await.unwrap(), "tok-short");
        assert_eq!(mgr.access_token().await.unwrap(), "tok-short");
    }

    #[tokio::test]
    async fn test_provider_error_surfaces_and_clears_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "invalid_code"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let mgr = manager(&server.uri());

        let err = mgr.access_token().await.unwrap_err();
        assert!(matches!(err, PrismError::Authentication(_)));
        assert!(err.to_string().contains("invalid_code"));

        // The cleared cache means the next call performs a fresh exchange
        // rather than reusing stale state (expect(2) above).
        let err = mgr.access_token().await.unwrap_err();
        assert!(err.to_string().contains("invalid_code"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("gateway exploded"))
            .mount(&server)
            .await;

        let mgr = manager(&server.uri());
        let err = mgr.access_token().await.unwrap_err();
        assert!(matches!(err, PrismError::Authentication(_)));
        assert!(err.to_string().contains("gateway exploded"));
    }

    #[tokio::test]
    async fn test_missing_fields_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let mgr = manager(&server.uri());
        let err = mgr.access_token().await.unwrap_err();
        assert!(err.to_string().contains("missing access_token"));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(token_response("tok-1", 3600).set_delay(Duration::from_millis(50)))
            .expect(1)
            .mount(&server)
            .await;

        let mgr = Arc::new(manager(&server.uri()));
        let a = tokio::spawn({
            let mgr = Arc::clone(&mgr);
            async move { mgr.access_token().await }
        });
        let b = tokio::spawn({
            let mgr = Arc::clone(&mgr);
            async move { mgr.access_token().await }
        });

        assert_eq!(a.await.unwrap().unwrap(), "tok-1");
        assert_eq!(b.await.unwrap().unwrap(), "tok-1");
    }

    #[test]
    fn test_compute_expiry_subtracts_margin() {
        let now = Instant::now();
        let expiry = TokenManager::compute_expiry(now, 3600);
        assert_eq!(expiry - now, Duration::from_secs(3300));
    }

    #[test]
    fn test_compute_expiry_below_margin_precedes_now() {
        let now = Instant::now();
        let expiry = TokenManager::compute_expiry(now, 300);
        assert!(expiry <= now);
    }
}
