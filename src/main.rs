//! Prism - MCP server for Zoho Desk
//!
//! This binary runs as an MCP server using stdio transport, allowing
//! Claude Code or Claude Desktop to inspect Zoho Desk tickets through
//! natural language.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `ZOHO_CLIENT_ID`: OAuth client identifier
//! - `ZOHO_CLIENT_SECRET`: OAuth client secret
//! - `ZOHO_REFRESH_TOKEN`: long-lived refresh token
//!
//! Optional overrides for regional data centers:
//!
//! - `ZOHO_ACCOUNTS_URL` (default `https://accounts.zoho.com`)
//! - `ZOHO_DESK_URL` (default `https://desk.zoho.com/api/v1`)
//!
//! # Usage
//!
//! ```bash
//! # Run the MCP server
//! ./prism
//!
//! # Obtain a refresh token interactively (one-time)
//! ./prism setup
//! ```

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{fmt, EnvFilter};

use prism::{config, desk_client, server, setup};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // Initialize logging to stderr (critical for stdio transport!)
    // stdout is reserved for MCP JSON-RPC messages
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prism=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // One-shot OAuth bootstrap mode; prints a refresh token and exits.
    if std::env::args().nth(1).as_deref() == Some("setup") {
        return setup::run().await;
    }

    tracing::info!("Starting Prism MCP server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from environment; missing secrets are fatal.
    let config = config::Config::from_env().context("Failed to load configuration")?;

    tracing::debug!("Configuration loaded, desk_url: {}", config.desk_url);

    // Create the Desk client (owns the token manager)
    let desk_client =
        desk_client::DeskClient::new(&config).context("Failed to create Desk client")?;

    tracing::debug!("Desk client initialized");

    // Warm the token cache before serving so credential problems show up
    // immediately in the logs.
    tracing::info!("Verifying Zoho credentials...");
    if let Err(e) = desk_client.token_manager().access_token().await {
        let sanitized = e.sanitized_display(&config.secrets());
        tracing::error!(error = %sanitized, "Initial token refresh failed");
        // Continue anyway - the accounts server might become reachable
        // later. But warn the user clearly.
        tracing::warn!(
            "Server will start but may not be able to reach Zoho Desk. \
             Check ZOHO_* configuration and network connectivity."
        );
    }

    // Create the MCP server
    let server = server::PrismServer::new(desk_client);

    tracing::info!("Server initialized, starting stdio transport");

    // Serve on stdio transport
    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })
        .context("Failed to start server")?;

    tracing::info!("Server running, waiting for requests");

    // Wait for the service to complete (shutdown signal)
    service
        .waiting()
        .await
        .context("Server error during operation")?;

    tracing::info!("Server shutting down");

    Ok(())
}
