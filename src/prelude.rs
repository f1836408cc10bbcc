//! Convenience re-exports for common use.

pub use crate::agent::{Agent, AgentResponse};
pub use crate::chat::{ChatHistory, ChatTurn, TurnOutcome};
pub use crate::composer::{AgentComposer, AgentParams};
pub use crate::config::{AppConfig, ConnectionSettings};
pub use crate::error::{DbChatError, ErrorKind, Result};
pub use crate::provider::ModelProvider;
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments};
pub use crate::types::{ContentPart, GenerationSettings, ModelMessage, Role, Usage};
