//! The agent loop: reason, call tools, observe, answer.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_MAX_STEPS;
use crate::error::{DbChatError, Result};
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::{validate_arguments, ToolArguments, ToolExecutionContext};
use crate::types::{AgentToolCall, AgentToolResult, GenerationSettings, ModelMessage, Usage};

use super::response::AgentResponse;
use super::toolset::ToolSet;

/// Sampling temperature used for every agent.
pub const AGENT_TEMPERATURE: f64 = 0.1;

/// A model bound to a tool set and a system prompt.
///
/// Agents are immutable once built and can serve many turns concurrently.
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    tools: ToolSet,
    system_prompt: String,
    settings: GenerationSettings,
    max_steps: usize,
}

impl Agent {
    pub fn new(provider: Arc<dyn ModelProvider>, tools: ToolSet, system_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            system_prompt: system_prompt.into(),
            settings: GenerationSettings::builder()
                .temperature(AGENT_TEMPERATURE)
                .build(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Cap on model calls per turn (at least 1).
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Run one turn over `messages` and return the extended conversation.
    ///
    /// Tool calls run sequentially in the order the model emitted them.
    /// Failures the model can act on come back to it as error results;
    /// anything else ends the turn.
    pub async fn invoke(&self, mut messages: Vec<ModelMessage>) -> Result<AgentResponse> {
        let tool_defs = Some(self.tools.definitions()).filter(|defs| !defs.is_empty());
        let system = ModelMessage::system(self.system_prompt.clone());
        let mut usage = Usage::default();

        for step in 1..=self.max_steps {
            let request = ProviderRequest {
                messages: std::iter::once(system.clone())
                    .chain(messages.iter().cloned())
                    .collect(),
                settings: self.settings.clone(),
                tools: tool_defs.clone(),
            };

            debug!(step, model = self.provider.model_id(), "agent.step");
            let response = self.provider.generate_text(&request).await?;
            usage.merge(&response.usage);

            if response.tool_calls.is_empty() {
                messages.push(ModelMessage::assistant(response.text));
                return Ok(AgentResponse {
                    messages,
                    usage,
                    steps: step,
                });
            }

            messages.push(ModelMessage::assistant_tool_calls(
                response.text,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let result = self.run_tool(call).await?;
                messages.push(ModelMessage::tool_result(
                    result.tool_call_id,
                    result.result,
                    result.is_error,
                ));
            }
        }

        Err(DbChatError::AgentExecution(format!(
            "no final answer after {} model calls",
            self.max_steps
        )))
    }

    async fn run_tool(&self, call: &AgentToolCall) -> Result<AgentToolResult> {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "agent.tool_call.unknown");
            return Ok(error_result(call, format!("Tool '{}' not found", call.name)));
        };

        let args = ToolArguments::new(call.arguments.clone());
        if let Err(error) = validate_arguments(args.raw(), tool.parameters()) {
            warn!(tool = %call.name, %error, "agent.tool_call.invalid");
            return Ok(error_result(call, error.to_string()));
        }

        info!(tool = %call.name, "agent.tool_call");
        let ctx = ToolExecutionContext::for_call(&call.id, &call.name);
        match tool.execute(&args, &ctx).await {
            Ok(result) => Ok(AgentToolResult {
                tool_call_id: call.id.clone(),
                result,
                is_error: false,
            }),
            Err(error) if error.is_model_recoverable() => {
                warn!(tool = %call.name, %error, "agent.tool_call.error");
                Ok(error_result(call, error.to_string()))
            }
            Err(error) => Err(error),
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .field("tools", &self.tools.names())
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

fn error_result(call: &AgentToolCall, message: String) -> AgentToolResult {
    AgentToolResult {
        tool_call_id: call.id.clone(),
        result: json!({ "error": message }),
        is_error: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::provider::ProviderResponse;
    use crate::tools::{AgentTool, AgentToolParameters, Tool};
    use crate::types::Role;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedProvider {
        responses: Mutex<VecDeque<ProviderResponse>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ProviderResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn model_id(&self) -> &str {
            "scripted-1"
        }

        async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.responses.lock().unwrap().pop_front().unwrap_or_else(|| ProviderResponse {
                tool_calls: vec![call("loop", "execute_sql", json!({ "query": "select 1" }))],
                ..Default::default()
            }))
        }
    }

    fn call(id: &str, name: &str, arguments: serde_json::Value) -> AgentToolCall {
        AgentToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    fn text(answer: &str) -> ProviderResponse {
        ProviderResponse {
            text: answer.into(),
            ..Default::default()
        }
    }

    fn tools_calls(calls: Vec<AgentToolCall>) -> ProviderResponse {
        ProviderResponse {
            tool_calls: calls,
            ..Default::default()
        }
    }

    fn sql_tool(outcome: fn(&str) -> Result<serde_json::Value>) -> Arc<dyn Tool> {
        Arc::new(AgentTool::new(
            "execute_sql",
            "Run SQL",
            AgentToolParameters::object().string("query", "SQL", true).build(),
            move |args, _ctx| async move { outcome(args.get_str("query")?) },
        ))
    }

    fn agent(provider: Arc<ScriptedProvider>, tool: Arc<dyn Tool>) -> Agent {
        Agent::new(provider, ToolSet::from_parts(vec![tool], Vec::new()), "Seja breve.")
    }

    #[tokio::test]
    async fn answers_directly_without_tools() {
        let provider = ScriptedProvider::new(vec![text("Olá!")]);
        let agent = agent(provider.clone(), sql_tool(|_| Ok(json!("unused"))));

        let response = agent.invoke(vec![ModelMessage::user("oi")]).await.unwrap();

        assert_eq!(response.steps, 1);
        assert_eq!(response.messages.len(), 2);
        assert_eq!(response.final_text(), "Olá!");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages[0].text(), "Seja breve.");
        assert_eq!(requests[0].settings.temperature, Some(AGENT_TEMPERATURE));
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn runs_tools_in_order_and_feeds_results_back() {
        let provider = ScriptedProvider::new(vec![
            tools_calls(vec![
                call("a", "execute_sql", json!({ "query": "select 1" })),
                call("b", "execute_sql", json!({ "query": "select 2" })),
            ]),
            text("Pronto."),
        ]);
        let agent = agent(provider.clone(), sql_tool(|q| Ok(json!(format!("ran {q}")))));

        let response = agent.invoke(vec![ModelMessage::user("rode")]).await.unwrap();

        assert_eq!(response.steps, 2);
        let roles: Vec<Role> = response.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Tool, Role::Assistant]
        );
        let first = response.messages[2].tool_result_part().unwrap();
        assert_eq!(first.tool_call_id, "a");
        assert_eq!(first.result, json!("ran select 1"));
        assert_eq!(
            response.messages[3].tool_result_part().unwrap().result,
            json!("ran select 2")
        );

        // second request sees the tool observations
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 5);
    }

    #[tokio::test]
    async fn recoverable_failures_become_error_observations() {
        let provider = ScriptedProvider::new(vec![
            tools_calls(vec![
                call("a", "drop_everything", json!({})),
                call("b", "execute_sql", json!({})),
                call("c", "execute_sql", json!({ "query": "select * from aluno" })),
            ]),
            text("Não encontrei a tabela."),
        ]);
        let agent = agent(
            provider,
            sql_tool(|_| {
                Err(DbChatError::ToolExecution {
                    tool_name: "execute_sql".into(),
                    message: "relation \"aluno\" does not exist".into(),
                })
            }),
        );

        let response = agent.invoke(vec![ModelMessage::user("alunos?")]).await.unwrap();

        let results: Vec<&AgentToolResult> = response
            .messages
            .iter()
            .filter_map(ModelMessage::tool_result_part)
            .collect();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_error));
        assert!(results[0].result["error"].as_str().unwrap().contains("not found"));
        assert!(results[1].result["error"].as_str().unwrap().contains("query"));
        assert!(results[2].result["error"].as_str().unwrap().contains("does not exist"));
        assert_eq!(response.final_text(), "Não encontrei a tabela.");
    }

    #[tokio::test]
    async fn connectivity_failure_aborts_the_turn() {
        let provider = ScriptedProvider::new(vec![tools_calls(vec![call(
            "a",
            "execute_sql",
            json!({ "query": "select 1" }),
        )])]);
        let agent = agent(
            provider,
            sql_tool(|_| Err(DbChatError::Connectivity("connection reset".into()))),
        );

        let err = agent.invoke(vec![ModelMessage::user("oi")]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[tokio::test]
    async fn step_limit_is_an_agent_execution_error() {
        let provider = ScriptedProvider::new(Vec::new());
        let agent = agent(provider.clone(), sql_tool(|_| Ok(json!("1")))).with_max_steps(3);

        let err = agent.invoke(vec![ModelMessage::user("oi")]).await.unwrap_err();

        assert!(matches!(&err, DbChatError::AgentExecution(msg) if msg.contains('3')));
        assert_eq!(provider.requests.lock().unwrap().len(), 3);
    }
}
