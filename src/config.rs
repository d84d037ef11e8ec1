//! Configuration management for the Prism MCP server.
//!
//! This module handles loading configuration from environment variables,
//! with validation to ensure all required values are present. Missing
//! variables are collected and reported together so a misconfigured
//! deployment can be fixed in one pass.

use crate::error::PrismError;
use std::env;
use std::fmt;

/// Default Zoho accounts (identity provider) base URL.
const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";

/// Default Zoho Desk API base URL.
const DEFAULT_DESK_URL: &str = "https://desk.zoho.com/api/v1";

/// Configuration for connecting to Zoho Desk.
///
/// The three OAuth secrets are required and loaded from environment
/// variables. They must never be logged or exposed in error messages.
#[derive(Clone)]
pub struct Config {
    /// OAuth client identifier issued by the Zoho API console.
    pub client_id: String,

    /// OAuth client secret.
    /// This value must never be logged or included in error messages.
    pub client_secret: String,

    /// Long-lived refresh token obtained via `prism setup`.
    /// This value must never be logged or included in error messages.
    pub refresh_token: String,

    /// Base URL for the Zoho accounts server (token endpoint host).
    pub accounts_url: String,

    /// Base URL for the Zoho Desk API (e.g. `https://desk.zoho.com/api/v1`).
    pub desk_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `ZOHO_CLIENT_ID`: OAuth client identifier
    /// - `ZOHO_CLIENT_SECRET`: OAuth client secret
    /// - `ZOHO_REFRESH_TOKEN`: long-lived refresh token
    ///
    /// # Optional Environment Variables
    ///
    /// - `ZOHO_ACCOUNTS_URL`: accounts server override (regional data centers)
    /// - `ZOHO_DESK_URL`: Desk API base URL override
    ///
    /// # Errors
    ///
    /// Returns `PrismError::Config` listing every missing required variable,
    /// or describing the first value that fails validation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// dotenvy::dotenv().ok();
    /// let config = Config::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self, PrismError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests supply their own lookup so they
    /// never touch the process environment.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, PrismError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let client_id = get("ZOHO_CLIENT_ID");
        let client_secret = get("ZOHO_CLIENT_SECRET");
        let refresh_token = get("ZOHO_REFRESH_TOKEN");

        // Report every missing secret at once, not just the first.
        let mut missing = Vec::new();
        if client_id.is_none() {
            missing.push("ZOHO_CLIENT_ID");
        }
        if client_secret.is_none() {
            missing.push("ZOHO_CLIENT_SECRET");
        }
        if refresh_token.is_none() {
            missing.push("ZOHO_REFRESH_TOKEN");
        }
        if !missing.is_empty() {
            return Err(PrismError::missing_env(&missing));
        }

        let accounts_url = Self::validate_base_url(
            "ZOHO_ACCOUNTS_URL",
            get("ZOHO_ACCOUNTS_URL").unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
        )?;
        let desk_url = Self::validate_base_url(
            "ZOHO_DESK_URL",
            get("ZOHO_DESK_URL").unwrap_or_else(|| DEFAULT_DESK_URL.to_string()),
        )?;

        Ok(Config {
            client_id: client_id.unwrap_or_default(),
            client_secret: client_secret.unwrap_or_default(),
            refresh_token: refresh_token.unwrap_or_default(),
            accounts_url,
            desk_url,
        })
    }

    /// Validates and normalizes a base URL.
    fn validate_base_url(name: &str, url: String) -> Result<String, PrismError> {
        // Remove trailing slash for consistency
        let url = url.trim_end_matches('/').to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PrismError::invalid_config(format!(
                "{} must start with http:// or https://",
                name
            )));
        }

        Ok(url)
    }

    /// Returns the secret values that must be redacted from any message.
    pub fn secrets(&self) -> [&str; 2] {
        [&self.client_secret, &self.refresh_token]
    }
}

/// Manual `Debug` so the OAuth secrets can never leak through `{:?}`
/// formatting in logs or test failure output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("accounts_url", &self.accounts_url)
            .field("desk_url", &self.desk_url)
            .finish()
    }
}
