//! SQL identifier whitelisting.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DbChatError, Result};

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier validation regex must compile")
});

/// Accept `value` only if it is a plain SQL identifier.
///
/// Identifiers are spliced into SQL text, so anything outside
/// `[A-Za-z_][A-Za-z0-9_]*` is refused.
pub fn safe_ident(value: &str) -> Result<&str> {
    if IDENT_RE.is_match(value) {
        Ok(value)
    } else {
        Err(DbChatError::Validation(format!(
            "invalid identifier '{value}': use only letters, digits and '_' for schema/table names"
        )))
    }
}
