//! Error types for the Prism MCP server.
//!
//! This module defines `PrismError`, the unified error type used throughout
//! the application for consistent error handling and propagation.
//!
//! # Security
//!
//! All error messages are sanitized to ensure OAuth credentials are never
//! leaked in logs or error responses. Use `sanitize_message()` when
//! constructing error messages from external sources.

use thiserror::Error;

/// Unified error type for all Prism operations.
///
/// The variants mirror the error taxonomy of the tool surface: caller
/// mistakes (`InvalidArgument`), credential-refresh failures
/// (`Authentication`), and Zoho Desk failures (`Upstream`). Unknown
/// operation names never reach this type - the MCP tool router answers
/// them with a method-not-found error naming the operation. Configuration
/// and client-setup failures only occur at startup.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration error - missing or invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Caller-supplied tool arguments are missing or of the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The refresh-token exchange with Zoho's accounts server failed.
    ///
    /// The cached access token is cleared when this is raised, so the next
    /// invocation retries the exchange from a clean slate.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The Zoho Desk call itself failed after a valid token was obtained.
    #[error("Zoho Desk error: {0}")]
    Upstream(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrismError {
    /// Creates a configuration error listing the missing environment variables.
    pub fn missing_env(var_names: &[&str]) -> Self {
        PrismError::Config(format!(
            "missing required environment variable(s): {}",
            var_names.join(", ")
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        PrismError::Config(message.into())
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        PrismError::InvalidArgument(message.into())
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        PrismError::Authentication(message.into())
    }

    /// Creates an upstream error.
    pub fn upstream(message: impl Into<String>) -> Self {
        PrismError::Upstream(message.into())
    }

    /// Sanitizes a message to remove any occurrence of the given secrets.
    ///
    /// This is critical for security - the client secret, refresh token, and
    /// current access token must never appear in logs, error messages, or
    /// tool responses.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to sanitize
    /// * `secrets` - The secret values to strip from the message
    ///
    /// # Returns
    ///
    /// The message with any occurrence of a secret replaced with `[REDACTED]`
    #[must_use]
    pub fn sanitize_message(message: &str, secrets: &[&str]) -> String {
        let mut sanitized = message.to_string();
        for secret in secrets {
            if !secret.is_empty() {
                sanitized = sanitized.replace(secret, "[REDACTED]");
            }
        }
        sanitized
    }

    /// Creates a sanitized version of this error's display message.
    ///
    /// Use this when including error details in logs or responses.
    #[must_use]
    pub fn sanitized_display(&self, secrets: &[&str]) -> String {
        Self::sanitize_message(&self.to_string(), secrets)
    }
}
