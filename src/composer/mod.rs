//! Builds agents from connection parameters and caches them per credential set.

pub mod params;
pub mod source;

use std::sync::Arc;

use tracing::{debug, info};

use crate::agent::{Agent, ToolSet};
use crate::config::{AppConfig, DEFAULT_MAX_STEPS, DEFAULT_MCP_URL, DEFAULT_MODEL};
use crate::context::{build_context_tools, system_prompt};
use crate::error::{DbChatError, Result};
use crate::mcp::ConnectionDescriptor;
use crate::provider::{OpenAiProviderFactory, ProviderFactory};
use crate::util::cache::LruCache;

pub use params::AgentParams;
pub use source::{McpToolSource, ToolSource};

/// How many assembled agents are kept.
pub const AGENT_CACHE_CAPACITY: usize = 4;

/// Built agents keyed by the full parameter tuple.
pub type AgentCache = LruCache<AgentParams, Arc<Agent>>;

/// Assembles agents: remote tools, derived context tools, model and prompt.
pub struct AgentComposer {
    tool_source: Arc<dyn ToolSource>,
    provider_factory: Arc<dyn ProviderFactory>,
    mcp_url: String,
    max_steps: usize,
    cache: AgentCache,
}

impl AgentComposer {
    pub fn new(tool_source: Arc<dyn ToolSource>, provider_factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            tool_source,
            provider_factory,
            mcp_url: DEFAULT_MCP_URL.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            cache: AgentCache::new(AGENT_CACHE_CAPACITY),
        }
    }

    /// Production composer: MCP tool source and OpenAI provider, per `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let factory = OpenAiProviderFactory::new(config.openai_base_url.clone(), config.model_timeout)?;
        Ok(Self::new(
            Arc::new(McpToolSource::new(config.mcp_timeout)),
            Arc::new(factory),
        )
        .with_mcp_url(config.mcp_url.clone())
        .with_max_steps(config.max_steps))
    }

    pub fn with_mcp_url(mut self, url: impl Into<String>) -> Self {
        self.mcp_url = url.into();
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Build a fresh agent, bypassing the cache.
    ///
    /// Credentials are checked before any network I/O.
    pub async fn build_agent(&self, params: &AgentParams) -> Result<Agent> {
        if params.api_key.trim().is_empty() {
            return Err(DbChatError::Validation("API key is empty".into()));
        }
        if params.project_ref.trim().is_empty() {
            return Err(DbChatError::Configuration("project ref is not configured".into()));
        }

        let connection = ConnectionDescriptor::new(
            &self.mcp_url,
            &params.project_ref,
            &params.features,
            &params.access_token,
        )?;

        let base_tools = self.tool_source.fetch_tools(&connection).await?;
        let context_tools = build_context_tools(&base_tools)?;

        let model = Some(params.model.trim())
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL);
        let provider = self.provider_factory.create(&params.api_key, model)?;

        let tools = ToolSet::from_parts(base_tools, context_tools);
        debug!(tools = ?tools.names(), "agent.tools");

        Ok(Agent::new(provider, tools, system_prompt()).with_max_steps(self.max_steps))
    }

    /// Cached agent for `params`, building it on a miss.
    ///
    /// Concurrent misses for the same key may both build; the later insert wins.
    pub async fn get_agent(&self, params: &AgentParams) -> Result<Arc<Agent>> {
        if let Some(agent) = self.cache.get(params) {
            debug!(project_ref = %params.project_ref, "agent.cache.hit");
            return Ok(agent);
        }

        let agent = Arc::new(self.build_agent(params).await?);
        self.cache.insert(params.clone(), agent.clone());
        info!(
            project_ref = %params.project_ref,
            model = agent.provider().model_id(),
            tools = agent.tools().len(),
            "agent.built"
        );
        Ok(agent)
    }

    pub fn cached_agents(&self) -> usize {
        self.cache.len()
    }
}
