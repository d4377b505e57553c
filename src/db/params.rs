//! Typed parameter binding.
//!
//! Two binding paths exist:
//!
//! * [`FieldValue`]: validated payload values for INSERT/UPDATE statements.
//!   Each variant keeps the `Option` inside the typed case so a NULL still
//!   binds with the column's Postgres type (an untyped NULL fails the
//!   driver's type check against e.g. a timestamp column).
//! * [`with_bound_params`]: converts the `Values` produced by a built
//!   SELECT into `ToSql` trait objects using a two-pass collect/reference
//!   pattern, so the references stay valid for the closure's duration.

use super::executor::DbError;
use chrono::{NaiveDate, NaiveDateTime};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::Value;

/// A validated column value ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Boolean(Option<bool>),
    Date(Option<NaiveDate>),
    DateTime(Option<NaiveDateTime>),
    Decimal(Option<Decimal>),
}

impl FieldValue {
    pub fn as_sql(&self) -> &dyn ToSql {
        match self {
            FieldValue::Text(v) => v,
            FieldValue::Integer(v) => v,
            FieldValue::Boolean(v) => v,
            FieldValue::Date(v) => v,
            FieldValue::DateTime(v) => v,
            FieldValue::Decimal(v) => v,
        }
    }

}

/// Borrow a `&[&dyn ToSql]` slice from bound field values.
pub fn bind_slice(values: &[FieldValue]) -> Vec<&dyn ToSql> {
    values.iter().map(FieldValue::as_sql).collect()
}

/// Convert built-query values to `may_postgres` parameters and run `f`.
///
/// The built SELECTs in this crate only bind booleans, integers and strings;
/// anything else in `values` is a programming error and is reported as such.
///
/// # Errors
///
/// Returns `DbError::Other` for unsupported value types, or whatever `f`
/// returns.
pub fn with_bound_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, DbError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, DbError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut nulls: Vec<Option<i32>> = Vec::new();

    // First pass: collect values into typed vectors.
    for value in values.iter() {
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::Int(Some(i)) => ints.push(*i),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::String(Some(s)) => strings.push(s.clone()),
            Value::TinyInt(Some(i)) => ints.push(i32::from(*i)),
            Value::SmallInt(Some(i)) => ints.push(i32::from(*i)),
            Value::Unsigned(Some(u)) => big_ints.push(i64::from(*u)),
            Value::BigUnsigned(Some(u)) => {
                let i = i64::try_from(*u).map_err(|_| {
                    DbError::Other(format!("BigUnsigned value {u} exceeds i64::MAX"))
                })?;
                big_ints.push(i);
            }
            Value::Bool(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::String(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None) => nulls.push(None),
            other => {
                return Err(DbError::Other(format!(
                    "Unsupported value type in query: {other:?}"
                )));
            }
        }
    }

    // Second pass: reference the stored values in order.
    let mut bool_idx = 0;
    let mut int_idx = 0;
    let mut big_int_idx = 0;
    let mut string_idx = 0;
    let mut null_idx = 0;

    let mut params: Vec<&dyn ToSql> = Vec::new();
    for value in values.iter() {
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx] as &dyn ToSql);
                bool_idx += 1;
            }
            Value::Int(Some(_)) | Value::TinyInt(Some(_)) | Value::SmallInt(Some(_)) => {
                params.push(&ints[int_idx] as &dyn ToSql);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) | Value::Unsigned(Some(_)) | Value::BigUnsigned(Some(_)) => {
                params.push(&big_ints[big_int_idx] as &dyn ToSql);
                big_int_idx += 1;
            }
            Value::String(Some(_)) => {
                params.push(&strings[string_idx] as &dyn ToSql);
                string_idx += 1;
            }
            Value::Bool(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::String(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None) => {
                params.push(&nulls[null_idx] as &dyn ToSql);
                null_idx += 1;
            }
            other => {
                return Err(DbError::Other(format!(
                    "Unsupported value type in query: {other:?}"
                )));
            }
        }
    }

    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_slice_length_matches() {
        let values = vec![
            FieldValue::Text(Some("Anna".into())),
            FieldValue::Integer(None),
            FieldValue::Boolean(Some(true)),
        ];
        assert_eq!(bind_slice(&values).len(), 3);
    }

    #[test]
    fn converts_select_bind_values() {
        let values = sea_query::Values(vec![
            Value::BigInt(Some(7)),
            Value::String(Some("promoter".into())),
            Value::Bool(Some(false)),
            Value::Int(None),
        ]);
        let count = with_bound_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn rejects_unsupported_value_types() {
        let values = sea_query::Values(vec![Value::Float(Some(1.5))]);
        let err = with_bound_params(&values, |_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("Unsupported value type"));
    }
}
