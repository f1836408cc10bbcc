//! SQL text for the context tools. Callers must pass identifiers through
//! [`safe_ident`](super::safe_ident) first.

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_SAMPLE_LIMIT: i64 = 5;
pub const MAX_SAMPLE_LIMIT: i64 = 50;

/// Clamp a requested sample size into `1..=50`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_SAMPLE_LIMIT)
}

pub fn describe_table_sql(schema: &str, table: &str) -> String {
    format!(
        "select column_name, data_type, is_nullable, column_default \
         from information_schema.columns \
         where table_schema = '{schema}' and table_name = '{table}' \
         order by ordinal_position;"
    )
}

pub fn sample_rows_sql(schema: &str, table: &str, limit: i64) -> String {
    format!("select * from {schema}.{table} limit {};", clamp_limit(limit))
}

pub fn foreign_keys_sql(schema: &str, table: &str) -> String {
    format!(
        "select tc.constraint_name, kcu.column_name as local_column, \
         ccu.table_schema as foreign_table_schema, ccu.table_name as foreign_table, \
         ccu.column_name as foreign_column \
         from information_schema.table_constraints tc \
         join information_schema.key_column_usage kcu \
         on tc.constraint_name = kcu.constraint_name and tc.table_schema = kcu.table_schema \
         join information_schema.constraint_column_usage ccu \
         on ccu.constraint_name = tc.constraint_name \
         where tc.constraint_type = 'FOREIGN KEY' \
         and tc.table_schema = '{schema}' and tc.table_name = '{table}' \
         order by tc.constraint_name, kcu.ordinal_position;"
    )
}

pub const TABLE_ROW_COUNTS_SQL: &str = "select schemaname as schema, relname as table, \
     n_live_tup as estimated_rows \
     from pg_stat_user_tables \
     order by n_live_tup desc;";
