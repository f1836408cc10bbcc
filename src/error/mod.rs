//! Error types for dbchat.

use strum::Display;
use thiserror::Error;

/// Primary error type for all dbchat operations.
#[derive(Error, Debug)]
pub enum DbChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Agent execution error: {0}")]
    AgentExecution(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Provider error: {provider}: {message}")]
    Provider { provider: String, message: String },
}

/// The four failure classes a chat turn can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Connectivity,
    AgentExecution,
}

impl DbChatError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into the turn-level taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::Authentication(_) => ErrorKind::Configuration,
            Self::Validation(_) | Self::InvalidArgument(_) => ErrorKind::Validation,
            Self::Connectivity(_) | Self::Network(_) | Self::Timeout(_) | Self::Io(_) => {
                ErrorKind::Connectivity
            }
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorKind::Configuration,
                429 | 500..=599 => ErrorKind::Connectivity,
                _ => ErrorKind::AgentExecution,
            },
            Self::AgentExecution(_)
            | Self::Serialization(_)
            | Self::ToolExecution { .. }
            | Self::Provider { .. } => ErrorKind::AgentExecution,
        }
    }

    /// Whether the model can act on this failure when it comes back from a tool.
    ///
    /// Bad identifiers, malformed arguments and errors reported by the remote tool
    /// itself are returned to the model as observations; everything else ends the turn.
    pub fn is_model_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidArgument(_) | Self::ToolExecution { .. }
        )
    }
}

/// Render an error with its whole `source()` chain, one cause per line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str("\n  caused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DbChatError>;
