//! Tool-calling agent: one model, a fixed tool set and a system prompt.

pub mod agent;
pub mod response;
pub mod toolset;

pub use agent::Agent;
pub use response::AgentResponse;
pub use toolset::{ToolEntry, ToolSet};
