//! MCP (Model Context Protocol) server plumbing shared by both adapters.

pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::{ToolDefinition, ToolHandler};
