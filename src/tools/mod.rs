//! MCP tool implementations for Prism.
//!
//! This module contains the input types for MCP tools that expose
//! Zoho Desk operations.

mod inputs;

pub use inputs::*;
