//! Configuration system (layered: CLI flags > env > defaults).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DbChatError, Result};

pub const DEFAULT_FEATURES: &str = "database,docs";
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_MCP_URL: &str = "https://mcp.supabase.com/mcp";
pub const DEFAULT_LOG_FILE: &str = "agent.log";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const DEFAULT_MAX_STEPS: usize = 25;
pub const DEFAULT_MCP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;

/// Credentials and connection parameters the chat sidebar can override.
///
/// Blank fields mean "not set"; [`ConnectionSettings::with_overrides`] only lets
/// non-blank values win.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub api_key: String,
    pub project_ref: String,
    pub access_token: String,
    pub features: String,
}

impl ConnectionSettings {
    /// Layer `overrides` on top of `self`, field by field.
    pub fn with_overrides(&self, overrides: &ConnectionSettings) -> Self {
        fn pick(base: &str, over: &str) -> String {
            if over.trim().is_empty() {
                base.trim().to_string()
            } else {
                over.trim().to_string()
            }
        }

        Self {
            api_key: pick(&self.api_key, &overrides.api_key),
            project_ref: pick(&self.project_ref, &overrides.project_ref),
            access_token: pick(&self.access_token, &overrides.access_token),
            features: pick(&self.features, &overrides.features),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn has_project_ref(&self) -> bool {
        !self.project_ref.trim().is_empty()
    }

    pub fn has_access_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("api_key", &presence(&self.api_key))
            .field("project_ref", &self.project_ref)
            .field("access_token", &presence(&self.access_token))
            .field("features", &self.features)
            .finish()
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub connection: ConnectionSettings,
    pub model: String,
    pub mcp_url: String,
    pub openai_base_url: Option<String>,
    pub log_file: PathBuf,
    pub bind: String,
    pub max_steps: usize,
    pub mcp_timeout: Duration,
    pub model_timeout: Duration,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("connection", &self.connection)
            .field("model", &self.model)
            .field("mcp_url", &self.mcp_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("log_file", &self.log_file)
            .field("bind", &self.bind)
            .field("max_steps", &self.max_steps)
            .field("mcp_timeout", &self.mcp_timeout)
            .field("model_timeout", &self.model_timeout)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings {
                features: DEFAULT_FEATURES.to_string(),
                ..Default::default()
            },
            model: DEFAULT_MODEL.to_string(),
            mcp_url: DEFAULT_MCP_URL.to_string(),
            openai_base_url: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            bind: DEFAULT_BIND.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            mcp_timeout: Duration::from_secs(DEFAULT_MCP_TIMEOUT_SECS),
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Load from environment variables, reading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(key) = get("OPENAI_API_KEY") {
            config.connection.api_key = key;
        }
        if let Some(project_ref) = get("SUPABASE_PROJECT_REF") {
            config.connection.project_ref = project_ref;
        }
        if let Some(token) = get("SUPABASE_ACCESS_TOKEN") {
            config.connection.access_token = token;
        }
        if let Some(features) = get("SUPABASE_MCP_FEATURES") {
            config.connection.features = features;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(url) = get("SUPABASE_MCP_URL") {
            config.mcp_url = url;
        }
        config.openai_base_url = get("OPENAI_BASE_URL");
        if let Some(path) = get("AGENT_LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }
        if let Some(bind) = get("DBCHAT_BIND") {
            config.bind = bind;
        }
        if let Some(raw) = get("AGENT_MAX_STEPS") {
            config.max_steps = parse_number("AGENT_MAX_STEPS", &raw)?;
            if config.max_steps == 0 {
                return Err(DbChatError::Configuration(
                    "AGENT_MAX_STEPS must be at least 1".into(),
                ));
            }
        }
        if let Some(raw) = get("MCP_TIMEOUT_SECS") {
            config.mcp_timeout = Duration::from_secs(parse_number("MCP_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = get("MODEL_TIMEOUT_SECS") {
            config.model_timeout =
                Duration::from_secs(parse_number("MODEL_TIMEOUT_SECS", &raw)?);
        }

        Ok(config)
    }

    /// Log file path; relative paths resolve against the working directory.
    pub fn log_path(&self) -> PathBuf {
        if self.log_file.is_absolute() {
            return self.log_file.clone();
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(&self.log_file),
            Err(_) => self.log_file.clone(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| DbChatError::Configuration(format!("{key} must be a number, got '{raw}'")))
}

fn presence(value: &str) -> &'static str {
    if value.trim().is_empty() {
        "absent"
    } else {
        "present"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.connection.features, DEFAULT_FEATURES);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.mcp_url, DEFAULT_MCP_URL);
        assert_eq!(config.log_file, PathBuf::from("agent.log"));
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        assert!(!config.connection.has_api_key());
    }

    #[test]
    fn env_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("SUPABASE_PROJECT_REF", " abcd1234 "),
            ("SUPABASE_MCP_FEATURES", "database"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("MCP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.connection.api_key, "sk-test");
        assert_eq!(config.connection.project_ref, "abcd1234");
        assert_eq!(config.connection.features, "database");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.mcp_timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_features_keep_default() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("SUPABASE_MCP_FEATURES", "   ")])).unwrap();
        assert_eq!(config.connection.features, DEFAULT_FEATURES);
    }

    #[test]
    fn malformed_numbers_are_configuration_errors() {
        let err = AppConfig::from_lookup(lookup_from(&[("AGENT_MAX_STEPS", "many")]))
            .expect_err("non-numeric step limit should fail");
        assert!(matches!(err, DbChatError::Configuration(msg) if msg.contains("AGENT_MAX_STEPS")));
    }

    #[test]
    fn overrides_only_replace_non_blank_fields() {
        let defaults = ConnectionSettings {
            api_key: "sk-env".into(),
            project_ref: "envref".into(),
            access_token: "".into(),
            features: "database,docs".into(),
        };
        let overrides = ConnectionSettings {
            api_key: "".into(),
            project_ref: "uiref".into(),
            access_token: "tok".into(),
            features: " ".into(),
        };

        let merged = defaults.with_overrides(&overrides);
        assert_eq!(merged.api_key, "sk-env");
        assert_eq!(merged.project_ref, "uiref");
        assert_eq!(merged.access_token, "tok");
        assert_eq!(merged.features, "database,docs");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let settings = ConnectionSettings {
            api_key: "sk-secret".into(),
            project_ref: "ref".into(),
            access_token: "token-secret".into(),
            features: "database".into(),
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("token-secret"));
        assert!(rendered.contains("present"));
    }
}
