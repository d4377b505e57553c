//! DDL generation from entity metadata.
//!
//! Every table gets the standard spine: `id BIGSERIAL PRIMARY KEY` plus
//! `created_at`/`updated_at` timestamps defaulting to `CURRENT_TIMESTAMP`.
//! Unique constraints are named `uq_{table}_{column}` so driver errors can be
//! mapped back to the offending field.

use crate::entity::{EntityDef, FieldDef, FieldKind};
use std::fmt::Write;

fn column_type(field: &FieldDef) -> String {
    match field.kind {
        FieldKind::Text | FieldKind::Email => match field.max_len {
            Some(n) => format!("VARCHAR({n})"),
            None => "TEXT".to_string(),
        },
        FieldKind::Integer => "BIGINT".to_string(),
        FieldKind::Boolean => "BOOLEAN".to_string(),
        FieldKind::Date => "DATE".to_string(),
        FieldKind::DateTime => "TIMESTAMP".to_string(),
        FieldKind::Decimal => "NUMERIC(12, 2)".to_string(),
    }
}

fn column_sql(field: &FieldDef) -> String {
    let mut sql = format!("    {} {}", field.name, column_type(field));
    if field.required || field.sql_default.is_some() {
        sql.push_str(" NOT NULL");
    } else {
        sql.push_str(" NULL");
    }
    if let Some(default) = field.sql_default {
        sql.push_str(&format!(" DEFAULT {default}"));
    }
    if let Some(reference) = &field.references {
        sql.push_str(&format!(
            " REFERENCES {}(id) ON DELETE {}",
            reference.table,
            reference.on_delete.sql()
        ));
    }
    sql
}

/// Generate the `CREATE TABLE IF NOT EXISTS` statement for one entity.
pub fn create_table_sql(def: &EntityDef) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("    id BIGSERIAL PRIMARY KEY".to_string());
    for field in def.fields {
        lines.push(column_sql(field));
    }
    lines.push("    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());
    lines.push("    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());

    for field in def.fields.iter().filter(|f| f.unique) {
        lines.push(format!(
            "    CONSTRAINT uq_{}_{} UNIQUE ({})",
            def.table, field.name, field.name
        ));
    }
    if let [first, second] = def.composite_unique {
        lines.push(format!(
            "    CONSTRAINT uq_{}_{}_{} UNIQUE ({}, {})",
            def.table, first, second, first, second
        ));
    }

    let mut sql = String::new();
    let _ = writeln!(sql, "CREATE TABLE IF NOT EXISTS {} (", def.table);
    let _ = write!(sql, "{}", lines.join(",\n"));
    let _ = write!(sql, "\n)");
    sql
}

/// Distinct tables this entity references, excluding itself.
pub fn dependencies(def: &EntityDef) -> Vec<String> {
    let mut deps: Vec<String> = def
        .fields
        .iter()
        .filter_map(|f| f.references.as_ref())
        .map(|r| r.table.to_string())
        .filter(|t| t != def.table)
        .collect();
    deps.sort();
    deps.dedup();
    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::access::GROUP_USERS;
    use crate::entity::events::COMMITMENTS;
    use crate::entity::personnel::EMPLOYEES;

    #[test]
    fn employees_ddl_declares_policies_and_constraints() {
        let sql = create_table_sql(&EMPLOYEES);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS employees ("));
        assert!(sql.contains("id BIGSERIAL PRIMARY KEY"));
        assert!(sql.contains("email VARCHAR(255) NOT NULL"));
        assert!(sql.contains("country_id BIGINT NULL REFERENCES countries(id) ON DELETE SET NULL"));
        assert!(sql.contains("active BOOLEAN NOT NULL DEFAULT TRUE"));
        assert!(sql.contains("CONSTRAINT uq_employees_email UNIQUE (email)"));
        assert!(sql.contains("salary NUMERIC(12, 2) NULL"));
    }

    #[test]
    fn commitments_ddl_mixes_delete_policies() {
        let sql = create_table_sql(&COMMITMENTS);
        assert!(sql.contains("promoter_id BIGINT NOT NULL REFERENCES promoters(id) ON DELETE RESTRICT"));
        assert!(sql.contains("event_id BIGINT NOT NULL REFERENCES events(id) ON DELETE CASCADE"));
        assert!(sql.contains("state_id BIGINT NULL REFERENCES commitment_states(id) ON DELETE SET NULL"));
    }

    #[test]
    fn join_table_gets_composite_unique() {
        let sql = create_table_sql(&GROUP_USERS);
        assert!(sql.contains("CONSTRAINT uq_group_users_group_id_user_id UNIQUE (group_id, user_id)"));
        assert!(sql.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn dependency_extraction_is_distinct_and_sorted() {
        let deps = dependencies(&EMPLOYEES);
        assert_eq!(deps, vec!["countries", "departments", "genders", "occupations"]);
    }
}
