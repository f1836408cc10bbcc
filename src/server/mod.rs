//! HTTP front-end: the single-page chat and its JSON API.

pub mod routes;
pub mod sessions;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::chat::ChatTurn;
use crate::composer::AgentComposer;
use crate::config::AppConfig;
use crate::error::{DbChatError, Result};

pub use sessions::{SessionHandle, SessionStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub composer: Arc<AgentComposer>,
    pub turns: ChatTurn,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig, composer: Arc<AgentComposer>) -> Self {
        let turns = ChatTurn::new(composer.clone(), config.model.clone());
        Self {
            config: Arc::new(config),
            composer,
            turns,
            sessions: SessionStore::new(),
        }
    }

    /// Production state: composer wired to the MCP server and the OpenAI API.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let composer = Arc::new(AgentComposer::from_config(&config)?);
        Ok(Self::new(config, composer))
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::routes()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `config.bind` and serve until the process is stopped.
pub async fn serve(config: AppConfig) -> Result<()> {
    let bind = config.bind.clone();
    let state = AppState::from_config(config)?;
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| DbChatError::Configuration(format!("Failed to bind {bind}: {e}")))?;
    info!(addr = %listener.local_addr()?, "server.listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
