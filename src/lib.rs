//! dbchat: chat with a read-only database through an LLM agent.
//!
//! The agent talks to the Supabase MCP server for its data tools and to an
//! OpenAI-compatible Chat Completions API for reasoning.
//!
//! # Quick Start
//!
//! ```no_run
//! use dbchat::prelude::*;
//!
//! # async fn example() -> dbchat::Result<()> {
//! let config = AppConfig::from_env()?;
//! let composer = std::sync::Arc::new(AgentComposer::from_config(&config)?);
//! let turns = ChatTurn::new(composer, config.model.clone());
//!
//! let mut history = ChatHistory::new();
//! let outcome = turns
//!     .run(&mut history, "quantos alunos ativos existem?", &config.connection)
//!     .await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod chat;
pub mod cli;
pub mod composer;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod prelude;
pub mod provider;
pub mod server;
pub mod tools;
pub mod types;
pub mod util;

pub use error::{DbChatError, Result};
