//! The five derived context tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

use crate::error::{DbChatError, Result};
use crate::tools::{AgentToolParameters, Tool, ToolArguments, ToolExecutionContext};

use super::identifiers::safe_ident;
use super::queries::{self, DEFAULT_SAMPLE_LIMIT, DEFAULT_SCHEMA, MAX_SAMPLE_LIMIT};
use super::{EXECUTE_SQL_TOOL, LIST_TABLES_TOOL};

/// Which context tool a [`DerivedTool`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
pub enum DerivedKind {
    #[strum(serialize = "context_list_tables")]
    ListTables,
    #[strum(serialize = "context_describe_table")]
    DescribeTable,
    #[strum(serialize = "context_foreign_keys")]
    ForeignKeys,
    #[strum(serialize = "context_sample_rows")]
    SampleRows,
    #[strum(serialize = "context_table_row_counts")]
    TableRowCounts,
}

impl DerivedKind {
    pub fn description(self) -> &'static str {
        match self {
            Self::ListTables => {
                "Lista tabelas por schema para descobrir nomes corretos antes de montar consultas."
            }
            Self::DescribeTable => {
                "Mostra colunas de uma tabela (nome, tipo, nullable, default) usando information_schema."
            }
            Self::ForeignKeys => {
                "Lista chaves estrangeiras de uma tabela (coluna local -> tabela/coluna remota)."
            }
            Self::SampleRows => {
                "Busca uma amostra de linhas de uma tabela (limite 1-50) para entender os dados."
            }
            Self::TableRowCounts => {
                "Traz contagem aproximada de linhas por tabela para priorizar onde consultar."
            }
        }
    }

    /// Name of the remote tool this kind delegates to.
    pub fn base_tool_name(self) -> &'static str {
        match self {
            Self::ListTables => LIST_TABLES_TOOL,
            _ => EXECUTE_SQL_TOOL,
        }
    }

    fn parameters(self) -> AgentToolParameters {
        let table = |builder: crate::tools::types::ParameterBuilder| {
            builder
                .string("table", "Nome da tabela (sem schema).", true)
                .string("schema", "Schema da tabela (padrão: public).", false)
        };
        match self {
            Self::ListTables => AgentToolParameters::object()
                .string_array(
                    "schemas",
                    "Lista de schemas a inspecionar. Se vazio, usa 'public'.",
                    false,
                )
                .build(),
            Self::DescribeTable | Self::ForeignKeys => table(AgentToolParameters::object()).build(),
            Self::SampleRows => table(AgentToolParameters::object())
                .integer(
                    "limit",
                    "Quantidade de linhas para amostra (1-50).",
                    1,
                    MAX_SAMPLE_LIMIT,
                    false,
                )
                .build(),
            Self::TableRowCounts => AgentToolParameters::empty(),
        }
    }
}

/// A convenience tool layered over one remote tool.
///
/// The base tool is resolved once, when the tool is built.
#[derive(Clone)]
pub struct DerivedTool {
    kind: DerivedKind,
    base: Arc<dyn Tool>,
    parameters: AgentToolParameters,
}

impl DerivedTool {
    pub fn new(kind: DerivedKind, base: Arc<dyn Tool>) -> Self {
        Self {
            kind,
            base,
            parameters: kind.parameters(),
        }
    }

    pub fn kind(&self) -> DerivedKind {
        self.kind
    }

    pub fn base(&self) -> &Arc<dyn Tool> {
        &self.base
    }

    /// Turn validated arguments into the payload for the base tool.
    pub fn base_payload(&self, args: &ToolArguments) -> Result<Value> {
        match self.kind {
            DerivedKind::ListTables => {
                let schemas = args.get_string_list("schemas")?;
                for schema in &schemas {
                    safe_ident(schema)?;
                }
                if schemas.is_empty() {
                    Ok(json!({}))
                } else {
                    Ok(json!({ "schemas": schemas }))
                }
            }
            DerivedKind::DescribeTable => {
                let (schema, table) = table_args(args)?;
                Ok(sql_payload(queries::describe_table_sql(schema, table)))
            }
            DerivedKind::ForeignKeys => {
                let (schema, table) = table_args(args)?;
                Ok(sql_payload(queries::foreign_keys_sql(schema, table)))
            }
            DerivedKind::SampleRows => {
                let (schema, table) = table_args(args)?;
                let limit = args.get_i64_opt("limit")?.unwrap_or(DEFAULT_SAMPLE_LIMIT);
                Ok(sql_payload(queries::sample_rows_sql(schema, table, limit)))
            }
            DerivedKind::TableRowCounts => Ok(sql_payload(queries::TABLE_ROW_COUNTS_SQL.to_string())),
        }
    }
}

impl std::fmt::Debug for DerivedTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedTool")
            .field("kind", &self.kind)
            .field("base", &self.base.name())
            .finish()
    }
}

#[async_trait]
impl Tool for DerivedTool {
    fn name(&self) -> &str {
        self.kind.as_ref()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> std::result::Result<Value, DbChatError> {
        let payload = self.base_payload(args)?;
        tracing::debug!(tool = %self.kind, base = self.base.name(), "context.delegate");
        self.base.execute(&ToolArguments::new(payload), ctx).await
    }
}

/// `table` plus `schema` (alias `table_schema`, default `public`), both whitelisted.
fn table_args(args: &ToolArguments) -> Result<(&str, &str)> {
    let table = safe_ident(args.get_str("table")?)?;
    let schema = args
        .get_str_opt("schema")
        .or_else(|| args.get_str_opt("table_schema"))
        .unwrap_or(DEFAULT_SCHEMA);
    Ok((safe_ident(schema)?, table))
}

fn sql_payload(sql: String) -> Value {
    json!({ "query": sql })
}

/// Find a base tool by exact name.
pub fn require_tool(tools: &[Arc<dyn Tool>], name: &str) -> Result<Arc<dyn Tool>> {
    tools
        .iter()
        .find(|tool| tool.name() == name)
        .cloned()
        .ok_or_else(|| {
            DbChatError::Configuration(format!("tool '{name}' not found on the MCP connection"))
        })
}

/// Build every context tool over `base_tools`.
///
/// Fails with a configuration error if `list_tables` or `execute_sql` is missing.
pub fn build_context_tools(base_tools: &[Arc<dyn Tool>]) -> Result<Vec<DerivedTool>> {
    let list_tables = require_tool(base_tools, LIST_TABLES_TOOL)?;
    let execute_sql = require_tool(base_tools, EXECUTE_SQL_TOOL)?;

    Ok(DerivedKind::iter()
        .map(|kind| {
            let base = match kind.base_tool_name() {
                LIST_TABLES_TOOL => list_tables.clone(),
                _ => execute_sql.clone(),
            };
            DerivedTool::new(kind, base)
        })
        .collect())
}
