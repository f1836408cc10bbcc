//! Shared test helpers: a mock MCP server, a mock Chat Completions API and a log sink.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use dbchat::config::{AppConfig, ConnectionSettings};

pub const PROJECT_REF: &str = "abcd1234";
pub const API_KEY: &str = "sk-test";
pub const ACTIVE_STUDENTS_SQL: &str = "SELECT count(*) FROM alunos WHERE ativo = true";

/// SQL statements received by the mock `execute_sql` tool.
pub type QueryLog = Arc<Mutex<Vec<String>>>;

fn tool_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn tool_definition(name: &str) -> Value {
    match name {
        "list_tables" => json!({
            "name": "list_tables",
            "description": "Lists all tables in one or more schemas.",
            "inputSchema": tool_schema(
                json!({ "schemas": { "type": "array", "items": { "type": "string" } } }),
                &[],
            ),
        }),
        "execute_sql" => json!({
            "name": "execute_sql",
            "description": "Executes raw SQL in the Postgres database.",
            "inputSchema": tool_schema(json!({ "query": { "type": "string" } }), &["query"]),
        }),
        other => json!({
            "name": other,
            "description": format!("{other} tool"),
            "inputSchema": tool_schema(json!({}), &[]),
        }),
    }
}

/// JSON-RPC responder for the subset of MCP the client uses.
pub fn mcp_handler(queries: QueryLog, tools: Vec<&'static str>) -> impl Respond {
    move |request: &Request| {
        let body: Value = request.body_json().unwrap_or_else(|_| json!({}));
        let rpc_method = body.get("method").and_then(Value::as_str).unwrap_or_default();
        let id = body.get("id").cloned().unwrap_or_else(|| json!(1));

        match rpc_method {
            "initialize" => ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": { "name": "supabase-mock", "version": "0.1.0" }
                }
            })),
            "notifications/initialized" => ResponseTemplate::new(202),
            "tools/list" => {
                let definitions: Vec<Value> = tools.iter().map(|name| tool_definition(name)).collect();
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": { "tools": definitions }
                }))
            }
            "tools/call" => {
                let params = body.get("params").cloned().unwrap_or_else(|| json!({}));
                let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
                let text = match name {
                    "execute_sql" => {
                        let query = params
                            .pointer("/arguments/query")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        queries.lock().unwrap().push(query);
                        r#"[{"count":42}]"#.to_string()
                    }
                    "list_tables" => r#"[{"schema":"public","name":"alunos"}]"#.to_string(),
                    other => format!("{other} called"),
                };
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {
                        "content": [{ "type": "text", "text": text }],
                        "isError": false
                    }
                }))
            }
            _ => ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {}
            })),
        }
    }
}

/// Start a mock MCP server exposing `tools` at `/mcp`.
pub async fn start_mcp_server(tools: Vec<&'static str>) -> (MockServer, QueryLog) {
    let server = MockServer::start().await;
    let queries = QueryLog::default();

    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(mcp_handler(queries.clone(), tools))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    (server, queries)
}

pub const NO_RESULT_ANSWER: &str = "Não recebi o resultado da consulta.";

fn tool_message(body: &Value) -> Option<&Value> {
    body.get("messages")
        .and_then(Value::as_array)?
        .iter()
        .find(|m| m.get("role").and_then(Value::as_str) == Some("tool"))
}

/// Whether `message` answers the `execute_sql` call with the mock's row count.
fn carries_count(message: &Value) -> bool {
    message.get("tool_call_id").and_then(Value::as_str) == Some("call_1")
        && message
            .get("content")
            .and_then(Value::as_str)
            .is_some_and(|content| content.contains(r#""count":42"#))
}

/// Chat Completions responder: asks for `execute_sql` first, then answers with
/// `answer` only when the tool result for that call carries the row count.
pub fn openai_handler(answer: &'static str) -> impl Respond {
    move |request: &Request| {
        let body: Value = request.body_json().unwrap_or_else(|_| json!({}));
        let (message, finish_reason) = match tool_message(&body) {
            Some(result) => {
                let text = if carries_count(result) { answer } else { NO_RESULT_ANSWER };
                (json!({ "role": "assistant", "content": text }), "stop")
            }
            None => (
                json!({
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "execute_sql",
                            "arguments": json!({ "query": ACTIVE_STUDENTS_SQL }).to_string()
                        }
                    }]
                }),
                "tool_calls",
            ),
        };

        ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": message,
                "finish_reason": finish_reason
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 }
        }))
    }
}

pub async fn start_openai_server(answer: &'static str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_handler(answer))
        .mount(&server)
        .await;
    server
}

/// Config pointing at the mock servers.
pub fn test_config(mcp: &MockServer, openai: &MockServer) -> AppConfig {
    AppConfig {
        connection: ConnectionSettings {
            api_key: API_KEY.into(),
            project_ref: PROJECT_REF.into(),
            access_token: String::new(),
            features: "database".into(),
        },
        mcp_url: format!("{}/mcp", mcp.uri()),
        openai_base_url: Some(openai.uri()),
        ..AppConfig::default()
    }
}

/// In-memory writer for asserting log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = dbchat::logging::subscriber(self.clone(), EnvFilter::new("dbchat=debug"));
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
