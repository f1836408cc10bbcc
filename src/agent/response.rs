//! Result of one agent turn.

use serde::{Deserialize, Serialize};

use crate::types::{ModelMessage, Usage};

/// Everything an agent turn produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResponse {
    /// Input conversation followed by every generated message; the last one is the answer.
    pub messages: Vec<ModelMessage>,
    pub usage: Usage,
    /// Number of model calls made.
    pub steps: usize,
}

impl AgentResponse {
    pub fn last_message(&self) -> Option<&ModelMessage> {
        self.messages.last()
    }

    /// Text of the last message, empty when there is none.
    pub fn final_text(&self) -> String {
        self.last_message().map(ModelMessage::text).unwrap_or_default()
    }
}
