//! MCP tool definitions and the handler seam shared by both servers.

use crate::error::{ComicError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// A set of tools served over MCP.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name reported in `initialize`.
    fn server_name(&self) -> &'static str;

    /// Tools advertised by `tools/list`.
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Run one tool. Errors are rendered as an error envelope by the server.
    async fn call(&self, name: &str, arguments: Value) -> Result<Value>;
}

/// Deserialize tool arguments; a missing argument object counts as `{}`.
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| ComicError::Validation(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Serialize a tool result.
pub fn to_output<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Uniform failure payload for every tool.
pub fn error_envelope(message: &str) -> Value {
    json!({
        "error": message,
        "results": [],
        "metadata": { "error": true }
    })
}

/// Error for a tool name the handler does not know.
pub fn unknown_tool(name: &str) -> ComicError {
    ComicError::Validation(format!("Unknown tool: {}", name))
}
