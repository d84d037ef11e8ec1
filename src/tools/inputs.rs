//! Tool input parameter structs for MCP tools.
//!
//! This module defines the input types for each MCP tool, with
//! JSON Schema derivation for MCP tool discovery.
//!
//! Optional Zoho query parameters keep their camelCase wire names
//! (`needPublic`, `threadStatus`, ...) so the tool schema matches the
//! Desk API documentation verbatim.
//!
//! # Input Sanitization
//!
//! All input structs implement `sanitize()` which trims whitespace
//! from string fields. This should be called before processing input.

use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;

/// Helper function to trim an optional string.
fn trim_option(s: &Option<String>) -> Option<String> {
    s.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Input parameters for the get_zoho_ticket_details tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTicketDetailsInput {
    /// The unique ID of the ticket to retrieve.
    pub ticket_id: String,
}

impl GetTicketDetailsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
        }
    }
}

/// Input parameters for the get_zoho_thread_details tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetThreadDetailsInput {
    /// The unique ID of the ticket the thread belongs to.
    pub ticket_id: String,

    /// The unique ID of the thread to retrieve.
    pub thread_id: String,

    /// Extra representation to include in the response (e.g. 'plainText').
    #[serde(default)]
    pub include: Option<String>,
}

impl GetThreadDetailsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
            thread_id: self.thread_id.trim().to_string(),
            include: trim_option(&self.include),
        }
    }
}

/// Input parameters for the get_latest_zoho_thread tool.
///
/// All filters are optional; a filter that is not supplied is not sent to
/// Zoho at all.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetLatestThreadInput {
    /// The unique ID of the ticket.
    pub ticket_id: String,

    /// If true, only consider public threads.
    #[serde(default, rename = "needPublic")]
    pub need_public: Option<bool>,

    /// If true, only consider incoming threads.
    #[serde(default, rename = "needIncomingThread")]
    pub need_incoming_thread: Option<bool>,

    /// Extra representation to include in the response (e.g. 'plainText').
    #[serde(default)]
    pub include: Option<String>,

    /// Filter by thread delivery status: 'success' or 'failed'.
    #[serde(default, rename = "threadStatus")]
    pub thread_status: Option<String>,
}

impl GetLatestThreadInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
            need_public: self.need_public,
            need_incoming_thread: self.need_incoming_thread,
            include: trim_option(&self.include),
            thread_status: trim_option(&self.thread_status),
        }
    }
}

/// Input parameters for the list_zoho_threads tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListThreadsInput {
    /// The unique ID of the ticket whose threads to list.
    pub ticket_id: String,

    /// Maximum number of threads to return.
    #[serde(default)]
    pub limit: Option<u32>,

    /// Starting index for pagination.
    #[serde(default)]
    pub from: Option<u32>,
}

impl ListThreadsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
            limit: self.limit,
            from: self.from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_option_trims_whitespace() {
        let s = Some("  plainText  ".to_string());
        assert_eq!(trim_option(&s), Some("plainText".to_string()));
    }

    #[test]
    fn test_trim_option_filters_empty() {
        let s = Some("   ".to_string());
        assert_eq!(trim_option(&s), None);
    }

    #[test]
    fn test_get_ticket_details_input_deserialize() {
        let json = r#"{"ticket_id": "100000012345"}"#;
        let input: GetTicketDetailsInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.ticket_id, "100000012345");
    }

    #[test]
    fn test_get_ticket_details_input_sanitize() {
        let input = GetTicketDetailsInput {
            ticket_id: "  12345  ".to_string(),
        };
        assert_eq!(input.sanitize().ticket_id, "12345");
    }

    #[test]
    fn test_get_thread_details_input_deserialize() {
        let json = r#"{"ticket_id": "123", "thread_id": "456", "include": "plainText"}"#;
        let input: GetThreadDetailsInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.ticket_id, "123");
        assert_eq!(input.thread_id, "456");
        assert_eq!(input.include.as_deref(), Some("plainText"));
    }

    #[test]
    fn test_get_latest_thread_input_uses_camel_case_wire_names() {
        let json = r#"{
            "ticket_id": "123",
            "needPublic": true,
            "needIncomingThread": false,
            "threadStatus": "failed"
        }"#;
        let input: GetLatestThreadInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.need_public, Some(true));
        assert_eq!(input.need_incoming_thread, Some(false));
        assert_eq!(input.thread_status.as_deref(), Some("failed"));
    }

    #[test]
    fn test_get_latest_thread_input_defaults_optionals() {
        let json = r#"{"ticket_id": "123"}"#;
        let input: GetLatestThreadInput = serde_json::from_str(json).unwrap();
        assert!(input.need_public.is_none());
        assert!(input.need_incoming_thread.is_none());
        assert!(input.include.is_none());
        assert!(input.thread_status.is_none());
    }

    #[test]
    fn test_get_latest_thread_input_sanitize() {
        let input = GetLatestThreadInput {
            ticket_id: "  123  ".to_string(),
            need_public: Some(true),
            need_incoming_thread: None,
            include: Some("   ".to_string()),
            thread_status: Some("  success  ".to_string()),
        };
        let sanitized = input.sanitize();
        assert_eq!(sanitized.ticket_id, "123");
        assert_eq!(sanitized.include, None); // Whitespace-only becomes None
        assert_eq!(sanitized.thread_status.as_deref(), Some("success"));
        assert_eq!(sanitized.need_public, Some(true));
    }

    #[test]
    fn test_list_threads_input_deserialize() {
        let json = r#"{"ticket_id": "123", "limit": 20, "from": 5}"#;
        let input: ListThreadsInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.ticket_id, "123");
        assert_eq!(input.limit, Some(20));
        assert_eq!(input.from, Some(5));
    }

    #[test]
    fn test_list_threads_input_deserialize_minimal() {
        let json = r#"{"ticket_id": "123"}"#;
        let input: ListThreadsInput = serde_json::from_str(json).unwrap();
        assert!(input.limit.is_none());
        assert!(input.from.is_none());
    }
}
