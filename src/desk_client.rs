//! HTTP client for the Zoho Desk API.
//!
//! This module provides the `DeskClient` struct for making authenticated
//! requests to the Zoho Desk REST API. Every call obtains a valid access
//! token from the [`TokenManager`] first; the token is attached using Zoho's
//! custom `Zoho-oauthtoken` authorization scheme.
//!
//! Responses pass through untyped as `serde_json::Value` - this adapter adds
//! no data model of its own on top of what Zoho returns. The one deliberate
//! shape difference: `list_threads` unwraps the `data` envelope field and
//! returns the bare array.
//!
//! No retries are performed here. A 401 caused by a token that lapsed
//! between validation and use surfaces as an upstream error rather than
//! being silently retried.
//!
//! # Security
//!
//! OAuth credentials are never logged. All error messages are sanitized by
//! the server layer before logging.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::auth::TokenManager;
use crate::config::Config;
use crate::error::PrismError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Zoho's custom authorization scheme for OAuth access tokens.
const AUTH_SCHEME: &str = "Zoho-oauthtoken";

/// Maximum length for HTTP error response bodies to avoid leaking verbose
/// Zoho internals.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Optional parameters for the latest-thread lookup.
///
/// Only parameters that were explicitly supplied by the caller are sent;
/// an absent option is omitted from the query string entirely, never sent
/// as `false` or an empty value.
#[derive(Debug, Clone, Default)]
pub struct LatestThreadParams {
    /// Restrict to public threads.
    pub need_public: Option<bool>,

    /// Restrict to incoming threads.
    pub need_incoming_thread: Option<bool>,

    /// Extra representation to include (e.g. `plainText`).
    pub include: Option<String>,

    /// Filter by delivery status (`success` or `failed`).
    pub thread_status: Option<String>,
}

impl LatestThreadParams {
    /// Converts the supplied parameters to query pairs, skipping absent ones.
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(need_public) = self.need_public {
            query.push(("needPublic", need_public.to_string()));
        }
        if let Some(need_incoming) = self.need_incoming_thread {
            query.push(("needIncomingThread", need_incoming.to_string()));
        }
        if let Some(include) = &self.include {
            query.push(("include", include.clone()));
        }
        if let Some(status) = &self.thread_status {
            query.push(("threadStatus", status.clone()));
        }
        query
    }
}

/// HTTP client for the Zoho Desk API.
///
/// Handles authentication, request formatting, and error mapping for all
/// supported Desk operations. Cloning is cheap; the token manager is shared.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let client = DeskClient::new(&config)?;
///
/// let ticket = client.get_ticket("100000012345").await?;
/// ```
#[derive(Clone)]
pub struct DeskClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Base URL for the Desk API (e.g. `https://desk.zoho.com/api/v1`).
    base_url: String,

    /// Token lifecycle manager, shared with any clones of this client.
    auth: Arc<TokenManager>,

    /// Secret values for sanitizing error messages.
    /// SECURITY: Never log these values!
    secrets: [String; 2],
}

impl DeskClient {
    /// Creates a new Desk client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `PrismError::HttpClient` if the HTTP client fails to
    /// initialize.
    pub fn new(config: &Config) -> Result<Self, PrismError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(PrismError::HttpClient)?;

        let auth = Arc::new(TokenManager::new(config, http.clone()));

        Ok(Self {
            http,
            base_url: config.desk_url.clone(),
            auth,
            secrets: [config.client_secret.clone(), config.refresh_token.clone()],
        })
    }

    /// Returns the secret values for sanitization purposes.
    ///
    /// This should ONLY be used for sanitizing error messages, never for
    /// logging.
    pub(crate) fn secrets_for_sanitization(&self) -> Vec<&str> {
        self.secrets.iter().map(String::as_str).collect()
    }

    /// Returns a shared handle to the token manager.
    ///
    /// Used at startup to warm the token cache before serving.
    pub fn token_manager(&self) -> Arc<TokenManager> {
        Arc::clone(&self.auth)
    }

    /// Validates that a required identifier is a non-empty string.
    ///
    /// Raised before any network activity, including the token refresh.
    fn validate_required(value: &str, field_name: &str) -> Result<(), PrismError> {
        if value.trim().is_empty() {
            return Err(PrismError::invalid_argument(format!(
                "{} must be a non-empty string",
                field_name
            )));
        }
        Ok(())
    }

    /// Gets full details of a single ticket.
    ///
    /// # Arguments
    ///
    /// * `ticket_id` - The unique ticket ID
    ///
    /// # Returns
    ///
    /// The full ticket JSON object exactly as Zoho returned it.
    pub async fn get_ticket(&self, ticket_id: &str) -> Result<Value, PrismError> {
        Self::validate_required(ticket_id, "ticket_id")?;
        let path = format!("/tickets/{}", ticket_id);
        self.get(&path, &[]).await
    }

    /// Gets full details of a single thread within a ticket.
    ///
    /// # Arguments
    ///
    /// * `ticket_id` - The unique ticket ID
    /// * `thread_id` - The unique thread ID
    /// * `include` - Optional extra representation (e.g. `plainText`)
    pub async fn get_thread(
        &self,
        ticket_id: &str,
        thread_id: &str,
        include: Option<&str>,
    ) -> Result<Value, PrismError> {
        Self::validate_required(ticket_id, "ticket_id")?;
        Self::validate_required(thread_id, "thread_id")?;
        let path = format!("/tickets/{}/threads/{}", ticket_id, thread_id);

        let mut query = Vec::new();
        if let Some(include) = include {
            query.push(("include", include.to_string()));
        }
        self.get(&path, &query).await
    }

    /// Gets the most recent thread of a ticket.
    ///
    /// # Arguments
    ///
    /// * `ticket_id` - The unique ticket ID
    /// * `params` - Optional filters; absent options are not sent at all
    pub async fn get_latest_thread(
        &self,
        ticket_id: &str,
        params: &LatestThreadParams,
    ) -> Result<Value, PrismError> {
        Self::validate_required(ticket_id, "ticket_id")?;
        let path = format!("/tickets/{}/latestThread", ticket_id);
        self.get(&path, &params.to_query()).await
    }

    /// Lists the threads of a ticket.
    ///
    /// Unlike the other operations this does not return the raw envelope:
    /// the nested `data` array is extracted, defaulting to an empty list
    /// when the field is absent. Callers rely on this shape.
    ///
    /// # Arguments
    ///
    /// * `ticket_id` - The unique ticket ID
    /// * `limit` - Maximum number of threads to return
    /// * `from` - Starting index for pagination
    pub async fn list_threads(
        &self,
        ticket_id: &str,
        limit: Option<u32>,
        from: Option<u32>,
    ) -> Result<Vec<Value>, PrismError> {
        Self::validate_required(ticket_id, "ticket_id")?;
        let path = format!("/tickets/{}/threads", ticket_id);

        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(from) = from {
            query.push(("from", from.to_string()));
        }

        let envelope = self.get(&path, &query).await?;
        Ok(envelope
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Makes an authenticated GET request to the Desk API.
    ///
    /// # Arguments
    ///
    /// * `path` - API endpoint path (e.g. `/tickets/123`)
    /// * `query` - Query parameters; only explicitly supplied ones appear here
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, PrismError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(path = %path, "Making Zoho Desk API request");

        let mut req = self
            .http
            .get(&url)
            .header("Authorization", format!("{} {}", AUTH_SCHEME, token));

        if !query.is_empty() {
            req = req.query(query);
        }

        let response = req.send().await.map_err(|e| {
            PrismError::upstream(format!("request to Zoho Desk failed: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PrismError::upstream(format!("failed to read Zoho Desk response: {}", e))
        })?;

        if !status.is_success() {
            return Err(Self::map_upstream_error(status, &body));
        }

        tracing::trace!(body = %body, "Zoho Desk API response");

        serde_json::from_str(&body).map_err(|e| {
            PrismError::upstream(format!("invalid JSON from Zoho Desk: {}", e))
        })
    }

    /// Maps an HTTP error response to an upstream error.
    ///
    /// The diagnostic is chosen in priority order: Zoho's `message` field,
    /// Zoho's `errorCode` field, the response body, else a generic fallback.
    fn map_upstream_error(status: reqwest::StatusCode, body: &str) -> PrismError {
        if let Ok(json) = serde_json::from_str::<Value>(body) {
            if let Some(message) = json.get("message").and_then(Value::as_str) {
                return PrismError::upstream(format!("HTTP {}: {}", status.as_u16(), message));
            }
            if let Some(code) = json.get("errorCode").and_then(Value::as_str) {
                return PrismError::upstream(format!("HTTP {}: {}", status.as_u16(), code));
            }
        }

        let body = body.trim();
        if body.is_empty() {
            return PrismError::upstream(format!("HTTP {} from Zoho Desk", status.as_u16()));
        }

        // Truncate to avoid leaking verbose Zoho internals
        let body = if body.len() > MAX_ERROR_BODY_LEN {
            format!("{}...[truncated]", &body[..MAX_ERROR_BODY_LEN])
        } else {
            body.to_string()
        };
        PrismError::upstream(format!("HTTP {}: {}", status.as_u16(), body))
    }
}
