//! Model provider trait and the OpenAI implementation.

pub mod format;
pub mod http;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DbChatError;
use crate::tools::types::ToolDefinition;
use crate::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage, Usage};

pub use openai::OpenAiProvider;

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

/// A chat model that can answer with text or tool calls.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, DbChatError>;
}

/// Creates providers bound to one API key and model.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, api_key: &str, model_id: &str) -> Result<Arc<dyn ModelProvider>, DbChatError>;
}

/// Factory for [`OpenAiProvider`]s sharing one HTTP client.
#[derive(Clone)]
pub struct OpenAiProviderFactory {
    client: reqwest::Client,
    base_url: Option<String>,
    timeout: Duration,
}

impl OpenAiProviderFactory {
    /// `base_url` of `None` means the public OpenAI API.
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, DbChatError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url,
            timeout,
        })
    }
}

impl ProviderFactory for OpenAiProviderFactory {
    fn create(&self, api_key: &str, model_id: &str) -> Result<Arc<dyn ModelProvider>, DbChatError> {
        if api_key.trim().is_empty() {
            return Err(DbChatError::Validation("API key is empty".into()));
        }
        Ok(Arc::new(
            OpenAiProvider::new(
                self.client.clone(),
                model_id,
                api_key.trim(),
                self.base_url.clone(),
            )
            .request_timeout(self.timeout),
        ))
    }
}
