//! JSON resource shapes.
//!
//! Wire conventions: datetimes as `YYYY-MM-DD HH:MM:SS`, dates as
//! `YYYY-MM-DD`, decimals as strings, collections wrapped in
//! `{"data": [...], "links": {...}, "meta": {...}}`, single resources in
//! `{"data": {...}}`.

use crate::db::DbError;
use crate::entity::{EntityDef, FieldKind};
use chrono::{NaiveDate, NaiveDateTime};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Serde helpers for the wire datetime format.
pub mod wire {
    use super::DATETIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub mod datetime {
        use super::*;

        pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(&dt.format(DATETIME_FORMAT))
        }
    }

    pub mod datetime_opt {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.collect_str(&dt.format(DATETIME_FORMAT)),
                None => s.serialize_none(),
            }
        }
    }
}

/// Pagination window over a counted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub current: u64,
    pub per_page: u64,
    pub total: u64,
}

impl Page {
    pub fn last_page(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn offset(&self) -> u64 {
        self.current.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// 1-based index of the first item on this page, None when empty.
    pub fn from(&self, len: usize) -> Option<u64> {
        if len == 0 {
            None
        } else {
            Some(self.offset() + 1)
        }
    }

    pub fn to(&self, len: usize) -> Option<u64> {
        if len == 0 {
            None
        } else {
            Some(self.offset() + len as u64)
        }
    }
}

fn page_url(base: &str, page: u64, per_page: u64) -> String {
    format!("{base}?page={page}&per_page={per_page}")
}

/// `{"data": ...}` wrapper for single resources.
pub fn data_envelope(value: Value) -> Value {
    json!({ "data": value })
}

/// Laravel-style paginated collection envelope.
pub fn collection_envelope(items: Vec<Value>, base: &str, page: &Page) -> Value {
    let len = items.len();
    let last = page.last_page();
    json!({
        "data": items,
        "links": {
            "first": page_url(base, 1, page.per_page),
            "last": page_url(base, last, page.per_page),
            "prev": if page.current > 1 {
                Value::from(page_url(base, page.current - 1, page.per_page))
            } else {
                Value::Null
            },
            "next": if page.current < last {
                Value::from(page_url(base, page.current + 1, page.per_page))
            } else {
                Value::Null
            },
        },
        "meta": {
            "current_page": page.current,
            "per_page": page.per_page,
            "total": page.total,
            "last_page": last,
            "from": page.from(len),
            "to": page.to(len),
        },
    })
}

/// Verb listing for `/{resource}/methods`.
pub fn methods_doc() -> Value {
    json!({ "methods": ["GET", "POST", "PUT", "DELETE"] })
}

/// Embedded-object key for an FK field: `state_id` becomes `state`.
pub fn embed_key(field_name: &str) -> &str {
    field_name.strip_suffix("_id").unwrap_or(field_name)
}

/// Replace an FK scalar with its loaded row (or null) in a serialized item.
pub fn apply_embed(item: &mut Value, field_name: &str, loaded: Option<Value>) {
    if let Value::Object(map) = item {
        map.remove(field_name);
        map.insert(
            embed_key(field_name).to_string(),
            loaded.unwrap_or(Value::Null),
        );
    }
}

/// Decode a row into its resource JSON using only entity metadata.
///
/// Used for embedded lookup rows, where no typed model is in play. Skips
/// write-only columns.
///
/// # Errors
///
/// Returns `DbError` when a column is missing or has an unexpected type.
pub fn row_to_value(def: &EntityDef, row: &Row) -> Result<Value, DbError> {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(row.try_get::<&str, i64>("id")?));
    for field in def.fields {
        if field.write_only {
            continue;
        }
        let value = match field.kind {
            FieldKind::Text | FieldKind::Email => {
                json!(row.try_get::<&str, Option<String>>(field.name)?)
            }
            FieldKind::Integer => json!(row.try_get::<&str, Option<i64>>(field.name)?),
            FieldKind::Boolean => json!(row.try_get::<&str, Option<bool>>(field.name)?),
            FieldKind::Date => {
                json!(row
                    .try_get::<&str, Option<NaiveDate>>(field.name)?
                    .map(|d| d.format(DATE_FORMAT).to_string()))
            }
            FieldKind::DateTime => {
                json!(row
                    .try_get::<&str, Option<NaiveDateTime>>(field.name)?
                    .map(|d| d.format(DATETIME_FORMAT).to_string()))
            }
            FieldKind::Decimal => {
                json!(row
                    .try_get::<&str, Option<Decimal>>(field.name)?
                    .map(|d| d.to_string()))
            }
        };
        map.insert(field.name.to_string(), value);
    }
    let created = row.try_get::<&str, NaiveDateTime>("created_at")?;
    let updated = row.try_get::<&str, NaiveDateTime>("updated_at")?;
    map.insert(
        "created_at".to_string(),
        json!(created.format(DATETIME_FORMAT).to_string()),
    );
    map.insert(
        "updated_at".to_string(),
        json!(updated.format(DATETIME_FORMAT).to_string()),
    );
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::personnel::Employee;
    use crate::entity::ResourceModel;
    use chrono::NaiveDate;

    fn sample_employee() -> Employee {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        Employee {
            id: 1,
            first_name: "Anna".into(),
            last_name: "Schmidt".into(),
            email: "anna@example.com".into(),
            phone: None,
            birthday: NaiveDate::from_ymd_opt(1994, 6, 12),
            address: None,
            zip: None,
            city: None,
            country_id: Some(2),
            gender_id: None,
            department_id: None,
            occupation_id: None,
            weekly_hours: Some(40),
            salary: Some(Decimal::new(345050, 2)),
            hired_on: None,
            active: true,
            created_at: day.and_hms_opt(8, 30, 0).unwrap(),
            updated_at: day.and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn datetime_wire_format() {
        let value = serde_json::to_value(sample_employee()).unwrap();
        assert_eq!(value["created_at"], "2024-03-01 08:30:00");
        assert_eq!(value["birthday"], "1994-06-12");
        assert_eq!(value["salary"], "3450.50");
    }

    #[test]
    fn write_only_fields_never_serialize() {
        let user = crate::entity::access::User {
            id: 1,
            name: "Root".into(),
            email: "root@example.com".into(),
            active: true,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            updated_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(user).unwrap();
        assert!(value.get("password").is_none());
        // metadata agrees with the struct
        assert!(crate::entity::access::USERS.field("password").unwrap().write_only);
        let _ = Employee::DEF;
    }

    #[test]
    fn pagination_math() {
        let page = Page { current: 2, per_page: 5, total: 12 };
        assert_eq!(page.last_page(), 3);
        assert_eq!(page.offset(), 5);
        assert_eq!(page.from(5), Some(6));
        assert_eq!(page.to(5), Some(10));

        let empty = Page { current: 1, per_page: 5, total: 0 };
        assert_eq!(empty.last_page(), 1);
        assert_eq!(empty.from(0), None);
        assert_eq!(empty.to(0), None);
    }

    #[test]
    fn collection_envelope_links() {
        let page = Page { current: 2, per_page: 5, total: 12 };
        let env = collection_envelope(vec![json!({"id": 6})], "/api/employees", &page);
        assert_eq!(env["links"]["first"], "/api/employees?page=1&per_page=5");
        assert_eq!(env["links"]["prev"], "/api/employees?page=1&per_page=5");
        assert_eq!(env["links"]["next"], "/api/employees?page=3&per_page=5");
        assert_eq!(env["meta"]["current_page"], 2);
        assert_eq!(env["meta"]["total"], 12);

        let first = Page { current: 1, per_page: 5, total: 3 };
        let env = collection_envelope(vec![json!({}), json!({}), json!({})], "/api/skills", &first);
        assert_eq!(env["links"]["prev"], Value::Null);
        assert_eq!(env["links"]["next"], Value::Null);
        assert_eq!(env["meta"]["from"], 1);
        assert_eq!(env["meta"]["to"], 3);
    }

    #[test]
    fn embed_replaces_fk_scalar() {
        let mut item = json!({"id": 1, "state_id": 3});
        apply_embed(&mut item, "state_id", Some(json!({"id": 3, "name": "accepted"})));
        assert!(item.get("state_id").is_none());
        assert_eq!(item["state"]["name"], "accepted");

        let mut orphan = json!({"id": 2, "state_id": null});
        apply_embed(&mut orphan, "state_id", None);
        assert_eq!(orphan["state"], Value::Null);
    }

    #[test]
    fn methods_listing_is_fixed() {
        assert_eq!(
            methods_doc(),
            json!({"methods": ["GET", "POST", "PUT", "DELETE"]})
        );
    }
}
