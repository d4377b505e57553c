//! Payload validation.
//!
//! One field list per entity yields two rule sets: on create every required
//! field must be present; on update only provided fields are checked and
//! uniqueness excludes the row being updated. Checks run per field in order
//! (presence, type/format, uniqueness, referential existence), all failures
//! are collected, and any failure aborts before the first write.

use crate::db::{with_bound_params, DbExecutor, FieldValue};
use crate::entity::{EntityDef, FieldDef, FieldKind};
use crate::error::{field_label, ApiError, ValidationErrors};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::str::FromStr;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Validate a payload against an entity definition.
///
/// Returns the typed column values to bind, in field order. Unknown payload
/// keys are ignored.
///
/// # Errors
///
/// `ApiError::Validation` with all collected field errors, or `ApiError::Db`
/// if a uniqueness/existence probe fails.
pub fn validate(
    def: &'static EntityDef,
    payload: &Map<String, Value>,
    mode: Mode,
    exec: &dyn DbExecutor,
    exclude_id: Option<i64>,
) -> Result<Vec<(&'static str, FieldValue)>, ApiError> {
    let mut errors = ValidationErrors::new();
    let mut columns: Vec<(&'static str, FieldValue)> = Vec::new();

    for field in def.fields {
        let raw = match payload.get(field.name) {
            Some(v) => v,
            None => {
                if mode == Mode::Create && field.required {
                    errors.add(field.name, required_message(field));
                }
                continue;
            }
        };

        if raw.is_null() {
            // Required columns and columns carrying a DB default are NOT NULL.
            if field.required || field.sql_default.is_some() {
                errors.add(field.name, required_message(field));
            } else {
                columns.push((field.name, null_value(field.kind)));
            }
            continue;
        }

        let value = match parse_value(field, raw) {
            Ok(v) => v,
            Err(message) => {
                errors.add(field.name, message);
                continue;
            }
        };

        if field.unique {
            if is_taken(def, field, &value, exclude_id, exec)? {
                errors.add(
                    field.name,
                    format!("The {} has already been taken.", field_label(field.name)),
                );
                continue;
            }
        }

        if let Some(reference) = &field.references {
            if !reference_exists(reference.table, &value, exec)? {
                errors.add(
                    field.name,
                    format!("The selected {} is invalid.", field_label(field.name)),
                );
                continue;
            }
        }

        columns.push((field.name, value));
    }

    check_composite_unique(def, &columns, &mut errors, exec, exclude_id)?;

    if errors.is_empty() {
        Ok(columns)
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn required_message(field: &FieldDef) -> String {
    format!("The {} field is required.", field_label(field.name))
}

fn null_value(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Text | FieldKind::Email => FieldValue::Text(None),
        FieldKind::Integer => FieldValue::Integer(None),
        FieldKind::Boolean => FieldValue::Boolean(None),
        FieldKind::Date => FieldValue::Date(None),
        FieldKind::DateTime => FieldValue::DateTime(None),
        FieldKind::Decimal => FieldValue::Decimal(None),
    }
}

fn parse_value(field: &FieldDef, raw: &Value) -> Result<FieldValue, String> {
    let label = field_label(field.name);
    match field.kind {
        FieldKind::Text => {
            let s = raw
                .as_str()
                .ok_or_else(|| format!("The {label} field must be a string."))?;
            if let Some(max) = field.max_len {
                if s.chars().count() > max as usize {
                    return Err(format!(
                        "The {label} field must not be greater than {max} characters."
                    ));
                }
            }
            if field.hashed {
                let digest = Sha256::digest(s.as_bytes());
                return Ok(FieldValue::Text(Some(format!("{digest:x}"))));
            }
            Ok(FieldValue::Text(Some(s.to_string())))
        }
        FieldKind::Email => {
            let s = raw
                .as_str()
                .ok_or_else(|| format!("The {label} field must be a string."))?;
            if let Some(max) = field.max_len {
                if s.chars().count() > max as usize {
                    return Err(format!(
                        "The {label} field must not be greater than {max} characters."
                    ));
                }
            }
            if !EMAIL_RE.is_match(s) {
                return Err(format!("The {label} field must be a valid email address."));
            }
            Ok(FieldValue::Text(Some(s.to_string())))
        }
        FieldKind::Integer => raw
            .as_i64()
            .map(|i| FieldValue::Integer(Some(i)))
            .ok_or_else(|| format!("The {label} field must be an integer.")),
        FieldKind::Boolean => raw
            .as_bool()
            .map(|b| FieldValue::Boolean(Some(b)))
            .ok_or_else(|| format!("The {label} field must be true or false.")),
        FieldKind::Date => {
            let s = raw
                .as_str()
                .ok_or_else(|| format!("The {label} field must be a valid date (YYYY-MM-DD)."))?;
            NaiveDate::parse_from_str(s, crate::resource::DATE_FORMAT)
                .map(|d| FieldValue::Date(Some(d)))
                .map_err(|_| format!("The {label} field must be a valid date (YYYY-MM-DD)."))
        }
        FieldKind::DateTime => {
            let s = raw.as_str().ok_or_else(|| {
                format!("The {label} field must be a valid datetime (YYYY-MM-DD HH:MM:SS).")
            })?;
            NaiveDateTime::parse_from_str(s, crate::resource::DATETIME_FORMAT)
                .map(|d| FieldValue::DateTime(Some(d)))
                .map_err(|_| {
                    format!("The {label} field must be a valid datetime (YYYY-MM-DD HH:MM:SS).")
                })
        }
        FieldKind::Decimal => {
            let repr = match raw {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                _ => return Err(format!("The {label} field must be a number.")),
            };
            Decimal::from_str(&repr)
                .map(|d| FieldValue::Decimal(Some(d)))
                .map_err(|_| format!("The {label} field must be a number."))
        }
    }
}

fn probe_value(value: &FieldValue) -> Option<sea_query::Value> {
    match value {
        FieldValue::Text(Some(s)) => Some(sea_query::Value::String(Some(s.clone()))),
        FieldValue::Integer(Some(i)) => Some(sea_query::Value::BigInt(Some(*i))),
        _ => None,
    }
}

fn is_taken(
    def: &EntityDef,
    field: &FieldDef,
    value: &FieldValue,
    exclude_id: Option<i64>,
    exec: &dyn DbExecutor,
) -> Result<bool, ApiError> {
    use sea_query::{Alias, Expr, ExprTrait, PostgresQueryBuilder, Query};

    // Unique columns are text or integer; anything else has no probe.
    let Some(probe) = probe_value(value) else {
        return Ok(false);
    };

    let mut select = Query::select();
    select
        .column("id")
        .from(Alias::new(def.table))
        .and_where(Expr::col(field.name).eq(probe))
        .limit(1);
    if let Some(id) = exclude_id {
        select.and_where(Expr::col("id").ne(id));
    }
    let (sql, values) = select.build(PostgresQueryBuilder);

    let rows = with_bound_params(&values, |params| exec.query_all(&sql, params))?;
    Ok(!rows.is_empty())
}

fn reference_exists(
    table: &str,
    value: &FieldValue,
    exec: &dyn DbExecutor,
) -> Result<bool, ApiError> {
    use sea_query::{Alias, Expr, ExprTrait, PostgresQueryBuilder, Query};

    let FieldValue::Integer(Some(id)) = value else {
        return Ok(true);
    };

    let (sql, values) = Query::select()
        .column("id")
        .from(Alias::new(table))
        .and_where(Expr::col("id").eq(*id))
        .limit(1)
        .build(PostgresQueryBuilder);

    let rows = with_bound_params(&values, |params| exec.query_all(&sql, params))?;
    Ok(!rows.is_empty())
}

fn check_composite_unique(
    def: &EntityDef,
    columns: &[(&'static str, FieldValue)],
    errors: &mut ValidationErrors,
    exec: &dyn DbExecutor,
    exclude_id: Option<i64>,
) -> Result<(), ApiError> {
    use sea_query::{Alias, Expr, ExprTrait, PostgresQueryBuilder, Query};

    let [first, second] = def.composite_unique else {
        return Ok(());
    };
    // Both legs must be present, valid and not already rejected.
    if errors.contains(first) || errors.contains(second) {
        return Ok(());
    }
    let find = |name: &str| {
        columns
            .iter()
            .find(|(col, _)| *col == name)
            .and_then(|(_, v)| probe_value(v))
    };
    let (Some(a), Some(b)) = (find(first), find(second)) else {
        return Ok(());
    };

    let mut query = Query::select();
    query
        .column("id")
        .from(Alias::new(def.table))
        .and_where(Expr::col(*first).eq(a))
        .and_where(Expr::col(*second).eq(b))
        .limit(1);
    if let Some(id) = exclude_id {
        query.and_where(Expr::col("id").ne(id));
    }
    let (sql, values) = query.build(PostgresQueryBuilder);

    let rows = with_bound_params(&values, |params| exec.query_all(&sql, params))?;
    if !rows.is_empty() {
        errors.add(
            second,
            format!(
                "The {} has already been taken for this {}.",
                field_label(second),
                field_label(first)
            ),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockExecutor;
    use crate::entity::access::{GROUP_USERS, USERS};
    use crate::entity::events::COMMITMENTS;
    use crate::entity::personnel::EMPLOYEES;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn expect_validation(result: Result<Vec<(&'static str, FieldValue)>, ApiError>) -> ValidationErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_requires_mandatory_fields() {
        let exec = MockExecutor::new();
        let errors = expect_validation(validate(
            &EMPLOYEES,
            &payload(json!({"phone": "12345"})),
            Mode::Create,
            &exec,
            None,
        ));
        assert!(errors.contains("first_name"));
        assert!(errors.contains("last_name"));
        assert!(errors.contains("email"));
        assert!(!errors.contains("phone"));
    }

    #[test]
    fn update_ignores_missing_fields() {
        let exec = MockExecutor::new();
        let columns = validate(
            &EMPLOYEES,
            &payload(json!({"city": "Hamburg"})),
            Mode::Update,
            &exec,
            Some(7),
        )
        .unwrap();
        assert_eq!(columns, vec![("city", FieldValue::Text(Some("Hamburg".into())))]);
    }

    #[test]
    fn email_format_is_enforced() {
        let exec = MockExecutor::new();
        let errors = expect_validation(validate(
            &EMPLOYEES,
            &payload(json!({
                "first_name": "Anna",
                "last_name": "Schmidt",
                "email": "not-an-email"
            })),
            Mode::Create,
            &exec,
            None,
        ));
        assert!(errors.contains("email"));
    }

    #[test]
    fn date_and_datetime_formats_are_enforced() {
        let exec = MockExecutor::new();
        let errors = expect_validation(validate(
            &EMPLOYEES,
            &payload(json!({"birthday": "12.06.1994"})),
            Mode::Update,
            &exec,
            Some(1),
        ));
        assert!(errors.contains("birthday"));

        let columns = validate(
            &EMPLOYEES,
            &payload(json!({"birthday": "1994-06-12"})),
            Mode::Update,
            &exec,
            Some(1),
        )
        .unwrap();
        assert!(matches!(columns[0].1, FieldValue::Date(Some(_))));
    }

    #[test]
    fn explicit_null_clears_optional_fields_with_type() {
        let exec = MockExecutor::new();
        let columns = validate(
            &EMPLOYEES,
            &payload(json!({"hired_on": null, "country_id": null})),
            Mode::Update,
            &exec,
            Some(1),
        )
        .unwrap();
        assert!(columns.contains(&("hired_on", FieldValue::Date(None))));
        assert!(columns.contains(&("country_id", FieldValue::Integer(None))));
    }

    #[test]
    fn null_is_rejected_for_defaulted_columns() {
        let exec = MockExecutor::new();
        let errors = expect_validation(validate(
            &EMPLOYEES,
            &payload(json!({"active": null})),
            Mode::Update,
            &exec,
            Some(1),
        ));
        assert!(errors.contains("active"));
    }

    #[test]
    fn unique_probe_excludes_self_on_update() {
        let exec = MockExecutor::new();
        let _ = validate(
            &EMPLOYEES,
            &payload(json!({"email": "anna@example.com"})),
            Mode::Update,
            &exec,
            Some(9),
        )
        .unwrap();
        let sql = exec.sql();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].contains("employees"));
        assert!(sql[0].contains("<>"));
        // binds: probed value, excluded id, limit
        assert_eq!(exec.param_counts()[0], 3);
    }

    #[test]
    fn fk_existence_failure_reads_as_invalid_selection() {
        // The mock returns no rows, so every FK probe comes back missing.
        let exec = MockExecutor::new();
        let errors = expect_validation(validate(
            &COMMITMENTS,
            &payload(json!({
                "promoter_id": 1,
                "event_id": 2,
                "role": "Lead",
                "start_time": "2025-09-01 08:00:00",
                "end_time": "2025-09-01 16:00:00"
            })),
            Mode::Create,
            &exec,
            None,
        ));
        assert!(errors.contains("promoter_id"));
        assert!(errors.contains("event_id"));
    }

    #[test]
    fn password_is_digested_before_binding() {
        let exec = MockExecutor::new();
        let columns = validate(
            &USERS,
            &payload(json!({"password": "hunter2"})),
            Mode::Update,
            &exec,
            Some(1),
        )
        .unwrap();
        match &columns[0].1 {
            FieldValue::Text(Some(digest)) => {
                assert_eq!(digest.len(), 64);
                assert_ne!(digest, "hunter2");
            }
            other => panic!("expected text digest, got {other:?}"),
        }
    }

    #[test]
    fn composite_unique_is_probed_on_create() {
        // FK probes fail against the empty mock, which also demonstrates the
        // composite probe is skipped once a leg is rejected.
        let exec = MockExecutor::new();
        let errors = expect_validation(validate(
            &GROUP_USERS,
            &payload(json!({"group_id": 1, "user_id": 2})),
            Mode::Create,
            &exec,
            None,
        ));
        assert!(errors.contains("group_id"));
        assert!(errors.contains("user_id"));
    }

    #[test]
    fn composite_unique_probe_excludes_self_on_update() {
        let exec = MockExecutor::new();
        let columns = vec![
            ("group_id", FieldValue::Integer(Some(1))),
            ("user_id", FieldValue::Integer(Some(2))),
        ];
        let mut errors = ValidationErrors::new();
        check_composite_unique(&GROUP_USERS, &columns, &mut errors, &exec, Some(5)).unwrap();
        assert!(errors.is_empty());

        let sql = exec.sql();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].contains("group_users"));
        assert!(sql[0].contains("group_id"));
        assert!(sql[0].contains("user_id"));
        assert!(sql[0].contains("<>"));
    }

    #[test]
    fn string_max_length_is_enforced() {
        let exec = MockExecutor::new();
        let errors = expect_validation(validate(
            &EMPLOYEES,
            &payload(json!({"zip": "x".repeat(40)})),
            Mode::Update,
            &exec,
            Some(1),
        ));
        assert!(errors.contains("zip"));
    }
}
