//! # Prism
//!
//! Prism is an MCP (Model Context Protocol) server for Zoho Desk.
//!
//! It exposes read-only Zoho Desk operations as MCP tools, enabling AI
//! assistants like Claude to inspect help desk tickets and their
//! conversation threads through natural language.
//!
//! ## Features
//!
//! - **Ticket lookup**: full ticket details as JSON
//! - **Thread access**: list threads, fetch one thread, fetch the latest
//! - **OAuth lifecycle**: cached access tokens with single-flight refresh
//! - **Setup helper**: `prism setup` obtains the long-lived refresh token
//! - **Security**: OAuth secrets are never logged or exposed in error messages
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Error types with security-conscious message sanitization
//! - [`auth`] - OAuth access-token lifecycle against the Zoho accounts server
//! - [`desk_client`] - HTTP client for the Zoho Desk API
//! - [`server`] - MCP server implementation with tool routing
//! - [`tools`] - Tool input parameter structs
//! - [`setup`] - One-shot OAuth bootstrap flow
//!
//! ## Configuration
//!
//! Prism requires three environment variables:
//!
//! - `ZOHO_CLIENT_ID`: OAuth client identifier
//! - `ZOHO_CLIENT_SECRET`: OAuth client secret
//! - `ZOHO_REFRESH_TOKEN`: long-lived refresh token (from `prism setup`)
//!
//! Optional:
//! - `ZOHO_ACCOUNTS_URL`: accounts server override for regional data centers
//! - `ZOHO_DESK_URL`: Desk API base URL override
//! - `RUST_LOG`: Log level (e.g., `prism=debug`)
//!
//! ## Security Considerations
//!
//! The OAuth secrets are stored only in memory and are:
//! - Never logged at any log level
//! - Sanitized from all error messages
//! - Not included in any tool responses
//!
//! ## Example
//!
//! Using the [`DeskClient`](desk_client::DeskClient) directly:
//!
//! ```ignore
//! use prism::config::Config;
//! use prism::desk_client::DeskClient;
//!
//! async fn example() -> Result<(), prism::error::PrismError> {
//!     let config = Config::from_env()?;
//!     let client = DeskClient::new(&config)?;
//!
//!     let ticket = client.get_ticket("100000012345").await?;
//!     println!("{}", ticket["subject"]);
//!
//!     let threads = client.list_threads("100000012345", Some(10), None).await?;
//!     println!("{} thread(s)", threads.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod config;
pub mod desk_client;
pub mod error;
pub mod server;
pub mod setup;
pub mod tools;
