//! Schema bootstrap.
//!
//! On startup the server creates any missing tables in FK-dependency order
//! and inserts the seed rows for lookup entities. Both steps are idempotent
//! (`CREATE TABLE IF NOT EXISTS`, `ON CONFLICT DO NOTHING`), so restarting
//! against an existing database is a no-op.

pub mod ddl;
pub mod ordering;

use crate::db::{DbError, DbExecutor};
use crate::entity::{registry, EntityDef};
use may_postgres::types::ToSql;
use ordering::TableInfo;
use std::fmt;

#[derive(Debug)]
pub enum SchemaError {
    /// Circular foreign key declarations.
    Cycle(String),
    Db(DbError),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::Cycle(msg) => write!(f, "Schema ordering error: {msg}"),
            SchemaError::Db(e) => write!(f, "Schema bootstrap error: {e}"),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<DbError> for SchemaError {
    fn from(err: DbError) -> Self {
        SchemaError::Db(err)
    }
}

/// Create missing tables and seed the lookup entities.
///
/// # Errors
///
/// Returns `SchemaError` on cyclic references or any DDL/seed failure.
pub fn bootstrap(exec: &dyn DbExecutor) -> Result<(), SchemaError> {
    let tables: Vec<TableInfo> = registry()
        .iter()
        .map(|def| TableInfo {
            name: def.table.to_string(),
            sql: ddl::create_table_sql(def),
            dependencies: ddl::dependencies(def),
        })
        .collect();

    let order = ordering::topological_sort(&tables).map_err(SchemaError::Cycle)?;
    for name in &order {
        let table = tables
            .iter()
            .find(|t| &t.name == name)
            .ok_or_else(|| SchemaError::Cycle(format!("unknown table {name}")))?;
        exec.execute(&table.sql, &[])?;
    }
    tracing::info!(tables = order.len(), "schema ready");

    for def in registry() {
        seed_entity(exec, def)?;
    }
    Ok(())
}

fn seed_entity(exec: &dyn DbExecutor, def: &EntityDef) -> Result<(), SchemaError> {
    for row in def.seeds {
        let columns: Vec<&str> = row.iter().map(|(col, _)| *col).collect();
        let values: Vec<String> = row.iter().map(|(_, val)| (*val).to_string()).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("${i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT DO NOTHING",
            def.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
        exec.execute(&sql, &params)?;
    }
    if !def.seeds.is_empty() {
        tracing::debug!(table = def.table, rows = def.seeds.len(), "seeded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockExecutor;

    #[test]
    fn bootstrap_creates_dependencies_before_dependents() {
        let exec = MockExecutor::new();
        bootstrap(&exec).unwrap();
        let sql = exec.sql();

        let create_pos = |table: &str| {
            let needle = format!("CREATE TABLE IF NOT EXISTS {table} (");
            sql.iter().position(|s| s.starts_with(&needle)).unwrap()
        };
        assert!(create_pos("customers") < create_pos("events"));
        assert!(create_pos("events") < create_pos("commitments"));
        assert!(create_pos("users") < create_pos("group_users"));
    }

    #[test]
    fn seeds_are_idempotent_inserts() {
        let exec = MockExecutor::new();
        bootstrap(&exec).unwrap();
        let seeds: Vec<String> = exec
            .sql()
            .into_iter()
            .filter(|s| s.starts_with("INSERT INTO"))
            .collect();
        assert!(seeds.iter().all(|s| s.ends_with("ON CONFLICT DO NOTHING")));
        assert!(seeds.iter().any(|s| s.contains("INSERT INTO commitment_states")));
        assert!(seeds.iter().any(|s| s.contains("INSERT INTO countries (code, name)")));
        // transactional tables are never seeded
        assert!(!seeds.iter().any(|s| s.contains("INSERT INTO employees")));
    }
}
