//! API error taxonomy and driver error classification.
//!
//! Every failure path in the request pipeline funnels into [`ApiError`],
//! which the HTTP layer turns into a status code plus the uniform JSON
//! envelope. Driver errors are classified by message pattern since
//! `may_postgres` does not expose SQLSTATE codes through its public error
//! type.

use crate::db::DbError;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Field-keyed validation failures, Laravel envelope style.
///
/// A `BTreeMap` keeps the field order deterministic in responses and tests.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn to_json(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .errors
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        Value::Object(map)
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// Resource or route does not exist.
    NotFound,
    /// Payload failed validation; nothing was persisted.
    Validation(ValidationErrors),
    /// Referential restriction blocked the operation.
    Conflict(String),
    /// Request body was not a JSON object.
    BadRequest(String),
    /// Known route, unsupported verb.
    MethodNotAllowed,
    /// Fixed-window request budget exhausted.
    RateLimited,
    /// Database failure not attributable to the request.
    Db(DbError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound => write!(f, "resource not found"),
            ApiError::Validation(_) => write!(f, "validation failed"),
            ApiError::Conflict(msg) => write!(f, "conflict: {msg}"),
            ApiError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            ApiError::MethodNotAllowed => write!(f, "method not allowed"),
            ApiError::RateLimited => write!(f, "rate limit exceeded"),
            ApiError::Db(e) => write!(f, "database error: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Db(err)
    }
}

impl ApiError {
    pub fn status(&self) -> usize {
        match self {
            ApiError::NotFound => 404,
            ApiError::Validation(_) => 422,
            ApiError::Conflict(_) => 409,
            ApiError::BadRequest(_) => 400,
            ApiError::MethodNotAllowed => 405,
            ApiError::RateLimited => 429,
            ApiError::Db(_) => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::NotFound => "Not Found",
            ApiError::Validation(_) => "Unprocessable Entity",
            ApiError::Conflict(_) => "Conflict",
            ApiError::BadRequest(_) => "Bad Request",
            ApiError::MethodNotAllowed => "Method Not Allowed",
            ApiError::RateLimited => "Too Many Requests",
            ApiError::Db(_) => "Internal Server Error",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::Conflict(_) => "conflict",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::RateLimited => "rate_limited",
            ApiError::Db(_) => "internal_error",
        }
    }

    /// Uniform error envelope. `debug` adds driver detail to 500 responses.
    pub fn envelope(&self, debug: bool) -> Value {
        match self {
            ApiError::Validation(errors) => json!({
                "error": self.code(),
                "message": "The given data was invalid.",
                "errors": errors.to_json(),
            }),
            ApiError::Db(e) if debug => json!({
                "error": self.code(),
                "message": "Internal server error.",
                "detail": e.to_string(),
            }),
            ApiError::Db(_) => json!({
                "error": self.code(),
                "message": "Internal server error.",
            }),
            other => json!({
                "error": other.code(),
                "message": other.message(),
            }),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NotFound => "Resource not found.".to_string(),
            ApiError::Validation(_) => "The given data was invalid.".to_string(),
            ApiError::Conflict(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::MethodNotAllowed => "Method not allowed.".to_string(),
            ApiError::RateLimited => "Too many requests.".to_string(),
            ApiError::Db(_) => "Internal server error.".to_string(),
        }
    }
}

/// True when the error indicates a query returned no rows.
///
/// Matches specific "no rows" patterns to avoid false positives from
/// "table not found" and similar driver errors.
pub fn is_no_rows_error(error: &DbError) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no rows")
        || msg.contains("no row")
        || msg.contains("row not found")
        || msg.contains("expected one row")
}

/// Map a write-path driver error back into the API taxonomy.
///
/// Unique violations on `uq_{table}_{column}` constraints race past the
/// pre-insert check occasionally; they are folded back into the same 422
/// shape the check would have produced. Foreign-key restrictions become 409.
pub fn classify_db_error(error: DbError, table: &str) -> ApiError {
    let msg = error.to_string();
    let lower = msg.to_lowercase();

    if lower.contains("duplicate key value violates unique constraint") {
        if let Some(constraint) = quoted_identifier(&msg) {
            let prefix = format!("uq_{table}_");
            if let Some(field) = constraint.strip_prefix(&prefix) {
                let mut errors = ValidationErrors::new();
                errors.add(field, format!("The {} has already been taken.", field_label(field)));
                return ApiError::Validation(errors);
            }
        }
        let mut errors = ValidationErrors::new();
        errors.add("id", "The record conflicts with an existing one.".to_string());
        return ApiError::Validation(errors);
    }

    if lower.contains("violates foreign key constraint") {
        return ApiError::Conflict(
            "The resource is still referenced by other records.".to_string(),
        );
    }

    ApiError::Db(error)
}

/// Human-readable field name for messages: `first_name` becomes `first name`.
pub fn field_label(field: &str) -> String {
    field.replace('_', " ")
}

fn quoted_identifier(msg: &str) -> Option<&str> {
    let start = msg.find('"')? + 1;
    let end = msg[start..].find('"')? + start;
    Some(&msg[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::NotFound.status(), 404);
        assert_eq!(ApiError::Validation(ValidationErrors::new()).status(), 422);
        assert_eq!(ApiError::Conflict("x".into()).status(), 409);
        assert_eq!(ApiError::MethodNotAllowed.status(), 405);
        assert_eq!(ApiError::RateLimited.status(), 429);
        assert_eq!(ApiError::Db(DbError::Query("q".into())).status(), 500);
    }

    #[test]
    fn validation_envelope_carries_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "The email field is required.".to_string());
        let env = ApiError::Validation(errors).envelope(false);
        assert_eq!(env["error"], "validation_error");
        assert_eq!(env["message"], "The given data was invalid.");
        assert_eq!(env["errors"]["email"][0], "The email field is required.");
    }

    #[test]
    fn db_detail_only_in_debug() {
        let plain = ApiError::Db(DbError::Query("secret".into())).envelope(false);
        assert!(plain.get("detail").is_none());
        let verbose = ApiError::Db(DbError::Query("secret".into())).envelope(true);
        assert!(verbose["detail"].as_str().unwrap().contains("secret"));
    }

    #[test]
    fn unique_violation_maps_to_field_error() {
        let err = DbError::Query(
            "db error: ERROR: duplicate key value violates unique constraint \"uq_employees_email\""
                .to_string(),
        );
        match classify_db_error(err, "employees") {
            ApiError::Validation(errors) => assert!(errors.contains("email")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn fk_violation_maps_to_conflict() {
        let err = DbError::Query(
            "db error: ERROR: update or delete on table \"customers\" violates foreign key constraint \"fk_events_customer_id\" on table \"events\""
                .to_string(),
        );
        assert!(matches!(
            classify_db_error(err, "customers"),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn no_rows_detection_is_specific() {
        assert!(is_no_rows_error(&DbError::Query("query returned no rows".into())));
        assert!(!is_no_rows_error(&DbError::Query("relation not found".into())));
    }
}
