//! Bridge MCP tools into the tool system.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::DbChatError;
use crate::tools::arguments::ToolArguments;
use crate::tools::dynamic::{DynamicTool, DynamicToolAdapter, DynamicToolProvider};
use crate::tools::tool::{Tool, ToolExecutionContext};
use crate::util::timeout::with_timeout;

use super::client::{MCPClient, MCPToolCallResult};
use super::connection::ConnectionDescriptor;
use super::schema::MCPToolSchema;

#[async_trait]
trait MCPClientOps: Send {
    async fn initialize(&mut self) -> Result<(), DbChatError>;
    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>, DbChatError>;
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult, DbChatError>;
}

#[async_trait]
impl MCPClientOps for MCPClient {
    async fn initialize(&mut self) -> Result<(), DbChatError> {
        MCPClient::initialize(self).await
    }

    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>, DbChatError> {
        MCPClient::list_tools(self).await
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult, DbChatError> {
        MCPClient::call_tool(self, name, arguments).await
    }
}

/// Adapts an MCP client to [`DynamicToolProvider`].
///
/// Calls are serialized over one session; each one (including the connect it
/// may trigger) is bounded by `timeout`.
pub struct MCPToolAdapter {
    client: Mutex<Box<dyn MCPClientOps>>,
    timeout: Duration,
}

impl MCPToolAdapter {
    pub fn new(client: MCPClient, timeout: Duration) -> Self {
        Self {
            client: Mutex::new(Box::new(client)),
            timeout,
        }
    }

    /// Adapter for the MCP server described by `connection`.
    pub fn for_connection(connection: &ConnectionDescriptor, timeout: Duration) -> Self {
        Self::new(MCPClient::new(Box::new(connection.transport())), timeout)
    }

    /// Connect, list the remote catalog and wrap each tool.
    pub async fn discover_tools(self: Arc<Self>) -> Result<Vec<Arc<dyn Tool>>, DbChatError> {
        DynamicToolAdapter::discover(self).await
    }

    #[cfg(test)]
    fn from_client_ops(client: Box<dyn MCPClientOps>, timeout: Duration) -> Self {
        Self {
            client: Mutex::new(client),
            timeout,
        }
    }
}

#[async_trait]
impl DynamicToolProvider for MCPToolAdapter {
    async fn list_tools(&self) -> Result<Vec<DynamicTool>, DbChatError> {
        let mut client = self.client.lock().await;
        let tools = with_timeout(self.timeout, async {
            client.initialize().await?;
            client.list_tools().await
        })
        .await?;
        Ok(tools.into_iter().map(DynamicTool::from).collect())
    }

    async fn execute_tool(
        &self,
        name: &str,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, DbChatError> {
        let mut client = self.client.lock().await;
        let result = with_timeout(self.timeout, async {
            client.initialize().await?;
            client.call_tool(name, args.raw().clone()).await
        })
        .await?;
        Ok(result.into_value_or_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;

    struct MockClientOps {
        tools: Vec<MCPToolSchema>,
        call_results: VecDeque<Result<MCPToolCallResult, DbChatError>>,
        stall: bool,
    }

    #[async_trait]
    impl MCPClientOps for MockClientOps {
        async fn initialize(&mut self) -> Result<(), DbChatError> {
            if self.stall {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(())
        }

        async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>, DbChatError> {
            Ok(self.tools.clone())
        }

        async fn call_tool(
            &mut self,
            _name: &str,
            _arguments: serde_json::Value,
        ) -> Result<MCPToolCallResult, DbChatError> {
            self.call_results
                .pop_front()
                .unwrap_or_else(|| Err(DbChatError::Connectivity("no mock result".into())))
        }
    }

    fn mock(call_results: Vec<Result<MCPToolCallResult, DbChatError>>) -> MockClientOps {
        MockClientOps {
            tools: vec![MCPToolSchema {
                name: "execute_sql".into(),
                description: Some("Run SQL".into()),
                input_schema: json!({ "type": "object" }),
            }],
            call_results: call_results.into(),
            stall: false,
        }
    }

    #[tokio::test]
    async fn discover_wraps_remote_tools() {
        let adapter = Arc::new(MCPToolAdapter::from_client_ops(
            Box::new(mock(Vec::new())),
            Duration::from_secs(5),
        ));
        let tools = adapter.discover_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name(), "execute_sql");
    }

    #[tokio::test]
    async fn execute_tool_returns_text_content() {
        let adapter = MCPToolAdapter::from_client_ops(
            Box::new(mock(vec![Ok(MCPToolCallResult {
                structured_content: None,
                text_content: Some("[{\"count\":42}]".into()),
                content: Vec::new(),
            })])),
            Duration::from_secs(5),
        );

        let value = adapter
            .execute_tool(
                "execute_sql",
                &ToolArguments::new(json!({ "query": "select count(*) from alunos" })),
                &ToolExecutionContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(value, json!("[{\"count\":42}]"));
    }

    #[tokio::test]
    async fn execute_tool_propagates_tool_error() {
        let adapter = MCPToolAdapter::from_client_ops(
            Box::new(mock(vec![Err(DbChatError::ToolExecution {
                tool_name: "execute_sql".into(),
                message: "permission denied".into(),
            })])),
            Duration::from_secs(5),
        );

        let err = adapter
            .execute_tool(
                "execute_sql",
                &ToolArguments::new(json!({ "query": "select 1" })),
                &ToolExecutionContext::default(),
            )
            .await
            .expect_err("tool errors should be propagated");
        assert!(matches!(err, DbChatError::ToolExecution { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_server_times_out() {
        let mut ops = mock(Vec::new());
        ops.stall = true;
        let adapter = MCPToolAdapter::from_client_ops(Box::new(ops), Duration::from_secs(30));

        let err = adapter.list_tools().await.expect_err("should time out");
        assert!(matches!(err, DbChatError::Timeout(30_000)));
    }
}
