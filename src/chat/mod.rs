//! Conversation interface: chat history, message conversion and one chat turn.

pub mod convert;
pub mod history;
pub mod turn;

pub use convert::to_structured_messages;
pub use history::{ChatEntry, ChatHistory};
pub use turn::{extract_response, invoke_agent, ChatTurn, TurnOutcome};
