//! Chat history to model messages.

use crate::types::{ModelMessage, Role};

use super::history::ChatEntry;

/// Map user/assistant/system entries to model messages, preserving order.
///
/// Entries with any other role are dropped.
pub fn to_structured_messages(history: &[ChatEntry]) -> Vec<ModelMessage> {
    history
        .iter()
        .filter_map(|entry| match entry.role.parse::<Role>() {
            Ok(Role::User) => Some(ModelMessage::user(entry.content.clone())),
            Ok(Role::Assistant) => Some(ModelMessage::assistant(entry.content.clone())),
            Ok(Role::System) => Some(ModelMessage::system(entry.content.clone())),
            Ok(Role::Tool) | Err(_) => None,
        })
        .collect()
}
