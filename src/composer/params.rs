//! Parameters for one agent build.

use std::fmt;

use crate::config::ConnectionSettings;

/// Everything that identifies a built agent; also the agent cache key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AgentParams {
    pub api_key: String,
    pub project_ref: String,
    pub access_token: String,
    pub features: String,
    pub model: String,
}

impl AgentParams {
    /// Combine resolved connection settings with the model id. Values are trimmed.
    pub fn from_settings(settings: &ConnectionSettings, model: &str) -> Self {
        Self {
            api_key: settings.api_key.trim().to_string(),
            project_ref: settings.project_ref.trim().to_string(),
            access_token: settings.access_token.trim().to_string(),
            features: settings.features.trim().to_string(),
            model: model.trim().to_string(),
        }
    }
}

impl fmt::Debug for AgentParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let presence = |v: &str| if v.is_empty() { "absent" } else { "present" };
        f.debug_struct("AgentParams")
            .field("api_key", &presence(&self.api_key))
            .field("project_ref", &self.project_ref)
            .field("access_token", &presence(&self.access_token))
            .field("features", &self.features)
            .field("model", &self.model)
            .finish()
    }
}
