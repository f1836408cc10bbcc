//! Schema-discovery tools derived from the remote `list_tables` and `execute_sql`,
//! and the system prompt that steers the model toward them.

pub mod identifiers;
pub mod prompt;
pub mod queries;
pub mod tools;

pub use identifiers::safe_ident;
pub use prompt::system_prompt;
pub use tools::{build_context_tools, require_tool, DerivedKind, DerivedTool};

/// Remote tool that lists tables.
pub const LIST_TABLES_TOOL: &str = "list_tables";
/// Remote tool that runs read-only SQL.
pub const EXECUTE_SQL_TOOL: &str = "execute_sql";
