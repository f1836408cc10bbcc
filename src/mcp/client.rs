//! MCP client for connecting to MCP servers.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientInfo, Content, JsonObject, ProtocolVersion,
    ResourceContents,
};
use rmcp::service::{ClientInitializeError, ServiceError};

use super::schema::MCPToolSchema;
use super::transport::{MCPRunningService, MCPTransport};
use crate::error::DbChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MCPConnectionState {
    Disconnected,
    Initialized,
}

/// Result of one `tools/call`.
#[derive(Debug, Clone)]
pub struct MCPToolCallResult {
    pub structured_content: Option<serde_json::Value>,
    pub text_content: Option<String>,
    pub content: Vec<serde_json::Value>,
}

impl MCPToolCallResult {
    /// Prefer structured output, then concatenated text, then the raw content list.
    pub fn into_value_or_text(self) -> serde_json::Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        if let Some(text) = self.text_content {
            return serde_json::Value::String(text);
        }
        serde_json::Value::Array(self.content)
    }
}

/// Client for a Model Context Protocol server.
pub struct MCPClient {
    transport: Box<dyn MCPTransport>,
    session: Option<MCPRunningService>,
    state: MCPConnectionState,
}

impl MCPClient {
    pub fn new(transport: Box<dyn MCPTransport>) -> Self {
        Self {
            transport,
            session: None,
            state: MCPConnectionState::Disconnected,
        }
    }

    pub fn connection_state(&self) -> MCPConnectionState {
        self.state
    }

    /// Open the session if needed. Idempotent while the session is alive.
    pub async fn initialize(&mut self) -> Result<(), DbChatError> {
        match self.state {
            MCPConnectionState::Initialized => {
                if self.session.as_ref().is_some_and(|s| !s.is_closed()) {
                    return Ok(());
                }
                self.session = None;
            }
            MCPConnectionState::Disconnected => {}
        }

        let session = self.connect_with_protocol_fallback().await?;
        tracing::debug!(endpoint = %strip_query(self.transport.endpoint()), "mcp.connected");
        self.session = Some(session);
        self.state = MCPConnectionState::Initialized;
        Ok(())
    }

    /// List available tools from the MCP server.
    pub async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>, DbChatError> {
        let session = self.active_session()?;

        let tools = match session.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => session
                .list_tools(None)
                .await
                .map(|page| page.tools)
                .map_err(|e| map_service_error("list_tools", e))?,
            Err(e) => return Err(map_service_error("list_tools", e)),
        };

        Ok(tools.into_iter().map(MCPToolSchema::from).collect())
    }

    /// Execute a tool on the MCP server.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult, DbChatError> {
        let arguments = coerce_tool_arguments(arguments)?;
        let session = self.active_session()?;

        let result = session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| map_service_error("call_tool", e))?;

        map_call_result(name, result)
    }

    async fn connect_with_protocol_fallback(&mut self) -> Result<MCPRunningService, DbChatError> {
        match self.transport.connect(client_info(ProtocolVersion::LATEST)).await {
            Ok(session) => return Ok(session),
            Err(error) if should_retry_protocol_fallback(&error) => {
                tracing::debug!(%error, "mcp.protocol.fallback");
            }
            Err(error) => return Err(map_client_initialize_error(error)),
        }

        self.transport
            .connect(client_info(ProtocolVersion::V_2024_11_05))
            .await
            .map_err(map_client_initialize_error)
    }

    fn active_session(&mut self) -> Result<&mut MCPRunningService, DbChatError> {
        match self.state {
            MCPConnectionState::Initialized => self
                .session
                .as_mut()
                .ok_or_else(|| DbChatError::Connectivity("MCP session is missing".into())),
            MCPConnectionState::Disconnected => Err(DbChatError::Configuration(
                "MCP client must be initialized first".into(),
            )),
        }
    }
}

fn client_info(protocol_version: ProtocolVersion) -> ClientInfo {
    ClientInfo {
        protocol_version,
        ..Default::default()
    }
}

fn should_retry_protocol_fallback(error: &ClientInitializeError) -> bool {
    match error {
        ClientInitializeError::JsonRpcError(error) => {
            let message = error.message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

/// Drop the query string; it carries the project ref and is noise in logs.
fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<Option<JsonObject>, DbChatError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        other => Err(DbChatError::InvalidArgument(format!(
            "MCP tool arguments must be a JSON object; got {other}"
        ))),
    }
}

fn extract_text_content(content: &[Content]) -> Option<String> {
    let lines: Vec<String> = content
        .iter()
        .filter_map(|item| {
            if let Some(text) = item.as_text() {
                return Some(text.text.clone());
            }
            match item.as_resource().map(|r| &r.resource) {
                Some(ResourceContents::TextResourceContents { text, .. }) => Some(text.clone()),
                _ => None,
            }
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<MCPToolCallResult, DbChatError> {
    let text_content = extract_text_content(&result.content);

    if result.is_error.unwrap_or(false) {
        let message = text_content
            .clone()
            .or_else(|| result.structured_content.as_ref().map(|v| v.to_string()))
            .unwrap_or_else(|| "MCP tool returned an error result".into());

        return Err(DbChatError::ToolExecution {
            tool_name: name.to_string(),
            message,
        });
    }

    let content = result
        .content
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect();

    Ok(MCPToolCallResult {
        structured_content: result.structured_content,
        text_content,
        content,
    })
}

fn map_client_initialize_error(error: ClientInitializeError) -> DbChatError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            DbChatError::Connectivity(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => DbChatError::Connectivity(
            format!("MCP initialize transport error ({context}): {error}"),
        ),
        ClientInitializeError::JsonRpcError(error) => DbChatError::Provider {
            provider: "mcp".into(),
            message: format!(
                "MCP initialize JSON-RPC error {}: {}",
                error.code.0, error.message
            ),
        },
        ClientInitializeError::Cancelled => {
            DbChatError::Connectivity("MCP initialize cancelled".into())
        }
        other => DbChatError::Connectivity(format!("MCP initialize error: {other}")),
    }
}

fn map_service_error(context: &str, error: ServiceError) -> DbChatError {
    match error {
        ServiceError::McpError(error) => DbChatError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP error {}: {}", error.code.0, error.message),
        },
        ServiceError::TransportSend(error) => {
            DbChatError::Connectivity(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            DbChatError::Connectivity(format!("{context}: MCP transport closed"))
        }
        ServiceError::UnexpectedResponse => DbChatError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: unexpected MCP response"),
        },
        ServiceError::Cancelled { reason } => {
            let suffix = reason.map(|r| format!(" ({r})")).unwrap_or_default();
            DbChatError::Connectivity(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => DbChatError::Timeout(timeout.as_millis() as u64),
        other => DbChatError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP service error: {other}"),
        },
    }
}
