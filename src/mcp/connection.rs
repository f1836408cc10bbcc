//! Connection parameters for the Supabase MCP endpoint.

use std::fmt;

use crate::config::DEFAULT_FEATURES;
use crate::error::{DbChatError, Result};

use super::transport::HttpTransport;

/// Where and how to reach one project's MCP server.
///
/// The URL always carries `read_only=true`; there is no way to build a
/// descriptor for a writable connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    endpoint: String,
    project_ref: String,
    features: Vec<String>,
    access_token: Option<String>,
}

impl ConnectionDescriptor {
    /// Validate and normalize connection parameters.
    ///
    /// `features` is a comma-separated list; blanks are dropped and an empty
    /// list falls back to [`DEFAULT_FEATURES`]. A blank `access_token` means an
    /// unauthenticated connection.
    pub fn new(endpoint: &str, project_ref: &str, features: &str, access_token: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(DbChatError::Configuration("MCP endpoint is empty".into()));
        }

        let project_ref = project_ref.trim();
        if project_ref.is_empty() {
            return Err(DbChatError::Configuration("project ref is empty".into()));
        }
        ensure_url_token("project ref", project_ref)?;

        let mut features = normalize_features(features);
        if features.is_empty() {
            features = normalize_features(DEFAULT_FEATURES);
        }
        for feature in &features {
            ensure_url_token("feature", feature)?;
        }

        let access_token = Some(access_token.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self {
            endpoint: endpoint.to_string(),
            project_ref: project_ref.to_string(),
            features,
            access_token,
        })
    }

    /// Full MCP URL including query parameters.
    pub fn url(&self) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}project_ref={}&read_only=true&features={}",
            self.endpoint,
            separator,
            self.project_ref,
            self.features_param()
        )
    }

    pub fn project_ref(&self) -> &str {
        &self.project_ref
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Features joined with commas, as sent on the wire.
    pub fn features_param(&self) -> String {
        self.features.join(",")
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// HTTP transport for this connection, with the bearer header when a token is set.
    pub fn transport(&self) -> HttpTransport {
        let transport = HttpTransport::new(self.url());
        match &self.access_token {
            Some(token) => transport.bearer_auth(token),
            None => transport,
        }
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("endpoint", &self.endpoint)
            .field("project_ref", &self.project_ref)
            .field("features", &self.features)
            .field("access_token", &self.access_token.as_ref().map(|_| "present"))
            .finish()
    }
}

fn normalize_features(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn ensure_url_token(what: &str, value: &str) -> Result<()> {
    let ok = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(DbChatError::Configuration(format!(
            "{what} '{value}' may only contain letters, digits, '_' and '-'"
        )))
    }
}
