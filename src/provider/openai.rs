//! OpenAI Chat Completions API provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::DbChatError;
use crate::types::{AgentToolCall, ContentPart, FinishReason, ModelMessage, Role, Usage};

use super::format::tool_result_to_string;
use super::http::{bearer_headers, send_error, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Non-streaming Chat Completions client for one model and key.
pub struct OpenAiProvider {
    client: reqwest::Client,
    model_id: String,
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenAiProvider {
    pub fn new(
        client: reqwest::Client,
        model_id: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
    ) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            client,
            model_id: model_id.into(),
            api_key: api_key.into(),
            base_url,
            timeout: None,
        }
    }

    /// Record the client's request timeout so expiries surface as timeouts.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(message_to_openai).collect();

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model_id.clone().into());
        body.insert("messages".into(), messages.into());

        let settings = &request.settings;
        if let Some(max) = settings.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(seed) = settings.seed {
            body.insert("seed".into(), seed.into());
        }
        if let Some(user) = &settings.user {
            body.insert("user".into(), user.clone().into());
        }

        if let Some(tools) = request.tools.as_ref().filter(|t| !t.is_empty()) {
            let defs: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body.insert("tools".into(), defs.into());
        }

        Value::Object(body)
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, DbChatError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model_id, messages = request.messages.len(), "openai.generate");

        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body_text));
        }

        let data: OpenAiChatResponse = resp.json().await.map_err(|e| send_error(e, self.timeout))?;
        parse_response(data)
    }
}

fn parse_response(data: OpenAiChatResponse) -> Result<ProviderResponse, DbChatError> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| DbChatError::AgentExecution("No choices in OpenAI response".into()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| AgentToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: serde_json::from_str(&tc.function.arguments)
                .unwrap_or(Value::String(tc.function.arguments)),
        })
        .collect();

    Ok(ProviderResponse {
        text: choice.message.content.unwrap_or_default(),
        usage: data
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default(),
        tool_calls,
        finish_reason: choice
            .finish_reason
            .as_deref()
            .and_then(|r| r.parse::<FinishReason>().ok()),
    })
}

fn message_to_openai(msg: &ModelMessage) -> Value {
    if let Some(result) = msg.tool_result_part() {
        return json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "content": tool_result_to_string(&result.result),
        });
    }

    let calls: Vec<Value> = msg
        .content
        .iter()
        .filter_map(|part| match part {
            ContentPart::ToolCall(tc) => Some(json!({
                "id": tc.id,
                "type": "function",
                "function": {
                    "name": tc.name,
                    "arguments": tc.arguments.to_string(),
                }
            })),
            _ => None,
        })
        .collect();

    let text = msg.text();
    if msg.role == Role::Assistant && !calls.is_empty() {
        let content = if text.is_empty() {
            Value::Null
        } else {
            Value::String(text)
        };
        return json!({ "role": "assistant", "content": content, "tool_calls": calls });
    }

    json!({ "role": msg.role.to_string(), "content": text })
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tools::types::ToolDefinition;
    use crate::types::GenerationSettings;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: String) -> OpenAiProvider {
        OpenAiProvider::new(reqwest::Client::new(), "gpt-4.1", "sk-test", Some(base_url))
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            messages: vec![
                ModelMessage::system("Responda em português."),
                ModelMessage::user("quantos alunos?"),
            ],
            settings: GenerationSettings::builder().temperature(0.1).build(),
            tools: Some(vec![ToolDefinition {
                name: "execute_sql".into(),
                description: "Run SQL".into(),
                parameters: json!({ "type": "object" }),
            }]),
        }
    }

    #[test]
    fn body_includes_tools_and_temperature() {
        let body = provider("http://unused".into()).build_request_body(&request());
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["temperature"], 0.1);
        assert_eq!(body["messages"][0], json!({ "role": "system", "content": "Responda em português." }));
        assert_eq!(body["tools"][0]["function"]["name"], "execute_sql");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn tool_messages_are_encoded_for_chat_completions() {
        let call = ModelMessage::assistant_tool_calls(
            "",
            vec![AgentToolCall {
                id: "call_1".into(),
                name: "execute_sql".into(),
                arguments: json!({ "query": "select 1" }),
            }],
        );
        let encoded = message_to_openai(&call);
        assert_eq!(encoded["content"], Value::Null);
        assert_eq!(encoded["tool_calls"][0]["function"]["arguments"], r#"{"query":"select 1"}"#);

        let result = message_to_openai(&ModelMessage::tool_result("call_1", json!("[{\"n\":1}]"), false));
        assert_eq!(
            result,
            json!({ "role": "tool", "tool_call_id": "call_1", "content": "[{\"n\":1}]" })
        );
    }

    #[tokio::test]
    async fn generate_text_parses_tool_calls_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": { "name": "execute_sql", "arguments": "{\"query\":\"select 1\"}" }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(server.uri()).generate_text(&request()).await.unwrap();

        assert_eq!(response.text, "");
        assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(response.usage.total_tokens, 15);
        assert_eq!(response.tool_calls[0].arguments, json!({ "query": "select 1" }));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_configuration_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let err = provider(server.uri()).generate_text(&request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[test]
    fn empty_choices_is_an_agent_execution_error() {
        let err = parse_response(OpenAiChatResponse {
            choices: Vec::new(),
            usage: None,
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AgentExecution);
    }
}
