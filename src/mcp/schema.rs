//! MCP schema types.

use serde::{Deserialize, Serialize};

use crate::tools::dynamic::DynamicTool;
use crate::tools::types::AgentToolParameters;

/// A tool as listed by an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPToolSchema {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

impl From<MCPToolSchema> for DynamicTool {
    fn from(tool: MCPToolSchema) -> Self {
        DynamicTool {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            parameters: AgentToolParameters::from_schema(tool.input_schema),
        }
    }
}

impl From<rmcp::model::Tool> for MCPToolSchema {
    fn from(tool: rmcp::model::Tool) -> Self {
        MCPToolSchema {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()),
            input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
        }
    }
}
