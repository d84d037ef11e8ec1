//! MCP server implementation for Prism.
//!
//! This module defines the `PrismServer` struct that implements the MCP
//! `ServerHandler` trait, exposing read-only Zoho Desk operations as tools.
//!
//! Every tool returns one text content block containing pretty-printed JSON,
//! passing Zoho's response through unmodified (except `list_zoho_threads`,
//! which returns the bare thread array). Unknown tool names are rejected by
//! the tool router with a method-not-found error naming the operation.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};

use crate::desk_client::{DeskClient, LatestThreadParams};
use crate::tools::{
    GetLatestThreadInput, GetThreadDetailsInput, GetTicketDetailsInput, ListThreadsInput,
};

/// The Prism MCP server.
///
/// This server exposes Zoho Desk read operations as MCP tools.
#[derive(Clone)]
pub struct PrismServer {
    /// Desk client for API operations.
    desk_client: DeskClient,
    /// Tool router for MCP tool dispatch.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PrismServer {
    /// Creates a new Prism server instance.
    ///
    /// # Arguments
    ///
    /// * `desk_client` - The Desk client for API operations
    pub fn new(desk_client: DeskClient) -> Self {
        Self {
            desk_client,
            tool_router: Self::tool_router(),
        }
    }

    /// A simple ping tool to verify the server is running.
    ///
    /// Returns "pong" on success.
    #[tool(description = "Test connectivity to the Prism MCP server. Returns 'pong' if the server is running correctly.")]
    fn ping(&self) -> String {
        tracing::debug!("ping tool called");
        "pong".to_string()
    }

    /// Get full details of a single Zoho Desk ticket.
    #[tool(name = "get_zoho_ticket_details", description = "Get full details of a Zoho Desk ticket as JSON. ticket_id is required.")]
    async fn get_zoho_ticket_details(
        &self,
        Parameters(input): Parameters<GetTicketDetailsInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "get_zoho_ticket_details tool called");

        let ticket = self
            .desk_client
            .get_ticket(&input.ticket_id)
            .await
            .map_err(|e| {
                let sanitized = self.sanitize_error(&e);
                tracing::error!(error = %sanitized, ticket_id = %input.ticket_id, "Failed to get ticket");
                sanitized
            })?;

        to_pretty_json(&ticket)
    }

    /// Get full details of a single thread within a ticket.
    #[tool(name = "get_zoho_thread_details", description = "Get full details of a single thread (message) of a Zoho Desk ticket. ticket_id and thread_id are required; pass include='plainText' for a plain-text body.")]
    async fn get_zoho_thread_details(
        &self,
        Parameters(input): Parameters<GetThreadDetailsInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(
            ticket_id = %input.ticket_id,
            thread_id = %input.thread_id,
            "get_zoho_thread_details tool called"
        );

        let thread = self
            .desk_client
            .get_thread(&input.ticket_id, &input.thread_id, input.include.as_deref())
            .await
            .map_err(|e| {
                let sanitized = self.sanitize_error(&e);
                tracing::error!(error = %sanitized, ticket_id = %input.ticket_id, "Failed to get thread");
                sanitized
            })?;

        to_pretty_json(&thread)
    }

    /// Get the most recent thread of a ticket.
    #[tool(name = "get_latest_zoho_thread", description = "Get the most recent thread of a Zoho Desk ticket. ticket_id is required; needPublic, needIncomingThread, include and threadStatus filters are optional and only sent when supplied.")]
    async fn get_latest_zoho_thread(
        &self,
        Parameters(input): Parameters<GetLatestThreadInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "get_latest_zoho_thread tool called");

        let params = LatestThreadParams {
            need_public: input.need_public,
            need_incoming_thread: input.need_incoming_thread,
            include: input.include.clone(),
            thread_status: input.thread_status.clone(),
        };

        let thread = self
            .desk_client
            .get_latest_thread(&input.ticket_id, &params)
            .await
            .map_err(|e| {
                let sanitized = self.sanitize_error(&e);
                tracing::error!(error = %sanitized, ticket_id = %input.ticket_id, "Failed to get latest thread");
                sanitized
            })?;

        to_pretty_json(&thread)
    }

    /// List the threads of a ticket.
    #[tool(name = "list_zoho_threads", description = "List the threads (conversation history) of a Zoho Desk ticket as a JSON array. ticket_id is required; limit and from control pagination.")]
    async fn list_zoho_threads(
        &self,
        Parameters(input): Parameters<ListThreadsInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "list_zoho_threads tool called");

        let threads = self
            .desk_client
            .list_threads(&input.ticket_id, input.limit, input.from)
            .await
            .map_err(|e| {
                let sanitized = self.sanitize_error(&e);
                tracing::error!(error = %sanitized, ticket_id = %input.ticket_id, "Failed to list threads");
                sanitized
            })?;

        to_pretty_json(&threads)
    }

    /// Sanitizes an error message to remove any OAuth secret.
    fn sanitize_error(&self, error: &crate::error::PrismError) -> String {
        error.sanitized_display(&self.desk_client.secrets_for_sanitization())
    }
}

#[tool_handler]
impl ServerHandler for PrismServer {
    /// Returns server information for the MCP initialize handshake.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Prism provides read-only access to Zoho Desk tickets. \
                 Use get_zoho_ticket_details for a ticket, list_zoho_threads \
                 for its conversation history, get_latest_zoho_thread for the \
                 most recent message, and get_zoho_thread_details for a single \
                 thread. Start with 'ping' to verify connectivity."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Renders a tool result as pretty-printed JSON.
fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| format!("failed to render response as JSON: {}", e))
}
