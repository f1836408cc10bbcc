//! One chat turn: validate settings, get the agent, run it, record the answer.

use std::sync::Arc;

use tracing::{error, info};

use crate::agent::{Agent, AgentResponse};
use crate::composer::{AgentComposer, AgentParams};
use crate::config::ConnectionSettings;
use crate::error::{error_chain, Result};
use crate::types::ModelMessage;

use super::convert::to_structured_messages;
use super::history::{ChatHistory, ROLE_ASSISTANT, ROLE_USER};

/// What the user sees at the end of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Reply(String),
    /// Inline error; nothing was added to the history besides the prompt.
    Error(String),
}

impl TurnOutcome {
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }
}

/// Runs turns against agents from a shared composer.
#[derive(Clone)]
pub struct ChatTurn {
    composer: Arc<AgentComposer>,
    model: String,
}

impl ChatTurn {
    pub fn new(composer: Arc<AgentComposer>, model: impl Into<String>) -> Self {
        Self {
            composer,
            model: model.into(),
        }
    }

    /// Run one turn for `prompt` with already-resolved `settings`.
    ///
    /// The prompt is always appended to `history`; the answer is appended only
    /// on success.
    pub async fn run(
        &self,
        history: &mut ChatHistory,
        prompt: &str,
        settings: &ConnectionSettings,
    ) -> TurnOutcome {
        history.append(ROLE_USER, prompt);

        if !settings.has_api_key() {
            return TurnOutcome::Error("API key not configured".into());
        }
        if !settings.has_project_ref() {
            return TurnOutcome::Error("project ref not configured".into());
        }

        info!(text_len = prompt.chars().count(), "chat.prompt");

        let params = AgentParams::from_settings(settings, &self.model);
        let agent = match self.composer.get_agent(&params).await {
            Ok(agent) => agent,
            Err(err) => {
                error!(error = %error_chain(&err), "agent.init.error");
                return TurnOutcome::Error(format!("failed to initialize the agent: {err}"));
            }
        };
        let headers = if settings.has_access_token() {
            "present"
        } else {
            "absent"
        };
        info!(
            project_ref = %params.project_ref,
            features = %params.features,
            headers,
            "agent.initialized"
        );

        let messages = to_structured_messages(history.entries());
        let response = match invoke_agent(&agent, messages).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %error_chain(&err), "agent.invoke.error");
                return TurnOutcome::Error(format!("agent execution failed: {err}"));
            }
        };

        let reply = extract_response(&response);
        info!(text_len = reply.chars().count(), "chat.response");
        history.append(ROLE_ASSISTANT, reply.clone());
        TurnOutcome::Reply(reply)
    }
}

/// Await one full agent turn.
pub async fn invoke_agent(agent: &Agent, messages: Vec<ModelMessage>) -> Result<AgentResponse> {
    agent.invoke(messages).await
}

/// Text of the last message, or the whole response as JSON when that is empty.
pub fn extract_response(response: &AgentResponse) -> String {
    let text = response.final_text();
    if !text.is_empty() {
        return text;
    }
    serde_json::to_string(response).unwrap_or_default()
}
