//! Where the base tool set comes from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::mcp::{ConnectionDescriptor, MCPToolAdapter};
use crate::tools::Tool;

/// Fetches the remote tools for a connection.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn fetch_tools(&self, connection: &ConnectionDescriptor) -> Result<Vec<Arc<dyn Tool>>>;
}

/// Production source: the MCP server behind the connection URL.
///
/// The returned tools share one MCP session that lives as long as they do.
#[derive(Debug, Clone)]
pub struct McpToolSource {
    timeout: Duration,
}

impl McpToolSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolSource for McpToolSource {
    async fn fetch_tools(&self, connection: &ConnectionDescriptor) -> Result<Vec<Arc<dyn Tool>>> {
        let adapter = Arc::new(MCPToolAdapter::for_connection(connection, self.timeout));
        let tools = adapter.discover_tools().await?;
        tracing::debug!(
            project_ref = connection.project_ref(),
            count = tools.len(),
            "mcp.tools.loaded"
        );
        Ok(tools)
    }
}
