//! Generic resource controller.
//!
//! One `ResourceController<M>` per entity implements the whole CRUD
//! contract. Reads go through built SELECT statements; writes are
//! parameterized INSERT/UPDATE/DELETE statements with `RETURNING *` so the
//! stored row (defaults and timestamps included) is what gets serialized.

use crate::config::AppConfig;
use crate::db::{bind_slice, with_bound_params, DbExecutor, FieldValue};
use crate::entity::{registry, ChildDef, EntityDef, ResourceModel};
use crate::error::{classify_db_error, is_no_rows_error, ApiError};
use crate::resource::{self, Page};
use crate::validate::{self, Mode};
use sea_query::{Alias, Asterisk, Expr, ExprTrait, Order, PostgresQueryBuilder, Query};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::marker::PhantomData;

/// Paging parameters as they arrived on the query string.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Restricts a listing to the children of one parent row.
pub struct ChildFilter<'a> {
    pub child: &'a ChildDef,
    pub parent_id: i64,
}

/// Object-safe CRUD surface, one implementation per entity.
pub trait ResourceHandler: Send + Sync {
    fn def(&self) -> &'static EntityDef;

    fn list(
        &self,
        exec: &dyn DbExecutor,
        cfg: &AppConfig,
        base: &str,
        page: PageQuery,
        filter: Option<&ChildFilter<'_>>,
    ) -> Result<Value, ApiError>;

    fn get(&self, exec: &dyn DbExecutor, id: i64) -> Result<Value, ApiError>;

    fn create(&self, exec: &dyn DbExecutor, payload: &Map<String, Value>)
        -> Result<Value, ApiError>;

    fn update(
        &self,
        exec: &dyn DbExecutor,
        id: i64,
        payload: &Map<String, Value>,
    ) -> Result<Value, ApiError>;

    fn delete(&self, exec: &dyn DbExecutor, id: i64) -> Result<(), ApiError>;

    fn exists(&self, exec: &dyn DbExecutor, id: i64) -> Result<bool, ApiError>;
}

pub struct ResourceController<M: ResourceModel> {
    _marker: PhantomData<fn() -> M>,
}

impl<M: ResourceModel> ResourceController<M> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn decode_rows(rows: &[may_postgres::Row]) -> Result<Vec<Value>, ApiError> {
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let model = M::from_row(row)?;
            let value = serde_json::to_value(&model)
                .map_err(|e| ApiError::Db(crate::db::DbError::Decode(e.to_string())))?;
            items.push(value);
        }
        Ok(items)
    }
}

impl<M: ResourceModel> Default for ResourceController<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ResourceModel> ResourceHandler for ResourceController<M> {
    fn def(&self) -> &'static EntityDef {
        M::DEF
    }

    fn list(
        &self,
        exec: &dyn DbExecutor,
        cfg: &AppConfig,
        base: &str,
        page: PageQuery,
        filter: Option<&ChildFilter<'_>>,
    ) -> Result<Value, ApiError> {
        let per_page = cfg.clamp_per_page(page.per_page);
        let (current, offset) = resolve_page(page.page, per_page);
        let table = M::DEF.table;

        let (total, rows) = match filter.and_then(|f| f.child.via.as_ref().map(|v| (f, v))) {
            Some((f, via)) => {
                // Indirect membership: join through the link table.
                let count_sql = format!(
                    "SELECT COUNT(*) FROM {} j WHERE j.{} = $1",
                    via.table, via.parent_fk
                );
                let rows_sql = format!(
                    "SELECT c.* FROM {table} c JOIN {} j ON j.{} = c.id \
                     WHERE j.{} = $1 ORDER BY c.id ASC LIMIT $2 OFFSET $3",
                    via.table, via.child_fk, via.parent_fk
                );
                let total = count_value(exec, &count_sql, &[&f.parent_id])?;
                let limit = per_page as i64;
                let skip = offset as i64;
                let rows = exec.query_all(&rows_sql, &[&f.parent_id, &limit, &skip])?;
                (total, rows)
            }
            None => {
                let mut count_q = Query::select();
                count_q.expr(Expr::cust("COUNT(*)")).from(Alias::new(table));
                let mut rows_q = Query::select();
                rows_q
                    .column(Asterisk)
                    .from(Alias::new(table))
                    .order_by("id", Order::Asc)
                    .limit(per_page)
                    .offset(offset);
                if let Some(f) = filter {
                    count_q.and_where(Expr::col(f.child.fk).eq(f.parent_id));
                    rows_q.and_where(Expr::col(f.child.fk).eq(f.parent_id));
                }

                let (count_sql, count_values) = count_q.build(PostgresQueryBuilder);
                let total = with_bound_params(&count_values, |params| {
                    let rows = exec.query_all(&count_sql, params)?;
                    Ok(rows
                        .first()
                        .map(|r| r.get::<usize, i64>(0))
                        .unwrap_or(0))
                })?;

                let (rows_sql, rows_values) = rows_q.build(PostgresQueryBuilder);
                let rows =
                    with_bound_params(&rows_values, |params| exec.query_all(&rows_sql, params))?;
                (total, rows)
            }
        };

        let mut items = Self::decode_rows(&rows)?;
        load_embeds(exec, M::DEF, &mut items)?;

        let page = Page {
            current,
            per_page,
            total: total.max(0) as u64,
        };
        Ok(resource::collection_envelope(items, base, &page))
    }

    fn get(&self, exec: &dyn DbExecutor, id: i64) -> Result<Value, ApiError> {
        let (sql, values) = Query::select()
            .column(Asterisk)
            .from(Alias::new(M::DEF.table))
            .and_where(Expr::col("id").eq(id))
            .build(PostgresQueryBuilder);
        let rows = with_bound_params(&values, |params| exec.query_all(&sql, params))?;
        let row = rows.first().ok_or(ApiError::NotFound)?;

        let mut items = Self::decode_rows(std::slice::from_ref(row))?;
        load_embeds(exec, M::DEF, &mut items)?;
        Ok(items.remove(0))
    }

    fn create(
        &self,
        exec: &dyn DbExecutor,
        payload: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        let columns = validate::validate(M::DEF, payload, Mode::Create, exec, None)?;
        let sql = build_insert_sql(M::DEF.table, &columns);
        let values: Vec<FieldValue> = columns.into_iter().map(|(_, v)| v).collect();
        let params = bind_slice(&values);

        let row = exec
            .query_one(&sql, &params)
            .map_err(|e| classify_db_error(e, M::DEF.table))?;

        let mut items = Self::decode_rows(std::slice::from_ref(&row))?;
        load_embeds(exec, M::DEF, &mut items)?;
        Ok(items.remove(0))
    }

    fn update(
        &self,
        exec: &dyn DbExecutor,
        id: i64,
        payload: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        if !self.exists(exec, id)? {
            return Err(ApiError::NotFound);
        }
        let columns = validate::validate(M::DEF, payload, Mode::Update, exec, Some(id))?;
        if columns.is_empty() {
            return self.get(exec, id);
        }
        let sql = build_update_sql(M::DEF.table, &columns);
        let values: Vec<FieldValue> = columns.into_iter().map(|(_, v)| v).collect();
        let mut params = bind_slice(&values);
        params.push(&id);

        let row = exec
            .query_one(&sql, &params)
            .map_err(|e| map_write_error(e, M::DEF.table))?;

        let mut items = Self::decode_rows(std::slice::from_ref(&row))?;
        load_embeds(exec, M::DEF, &mut items)?;
        Ok(items.remove(0))
    }

    fn delete(&self, exec: &dyn DbExecutor, id: i64) -> Result<(), ApiError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", M::DEF.table);
        let affected = exec
            .execute(&sql, &[&id])
            .map_err(|e| classify_db_error(e, M::DEF.table))?;
        if affected == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    fn exists(&self, exec: &dyn DbExecutor, id: i64) -> Result<bool, ApiError> {
        let (sql, values) = Query::select()
            .column("id")
            .from(Alias::new(M::DEF.table))
            .and_where(Expr::col("id").eq(id))
            .limit(1)
            .build(PostgresQueryBuilder);
        let rows = with_bound_params(&values, |params| exec.query_all(&sql, params))?;
        Ok(!rows.is_empty())
    }
}

/// Resolve the requested page into (current, row offset).
///
/// Paging values are client-supplied and degrade leniently: a page number
/// whose offset would overflow, or not fit a bigint bind, falls back to the
/// first page.
fn resolve_page(requested: Option<u64>, per_page: u64) -> (u64, u64) {
    let current = requested.unwrap_or(1).max(1);
    match current.checked_sub(1).and_then(|p| p.checked_mul(per_page)) {
        Some(offset) if offset <= i64::MAX as u64 => (current, offset),
        _ => (1, 0),
    }
}

/// Error mapping for `RETURNING *` writes: a row that vanished between the
/// existence probe and the statement is a 404, not a server error.
fn map_write_error(error: crate::db::DbError, table: &str) -> ApiError {
    if is_no_rows_error(&error) {
        return ApiError::NotFound;
    }
    classify_db_error(error, table)
}

fn count_value(exec: &dyn DbExecutor, sql: &str, params: &[&dyn may_postgres::types::ToSql]) -> Result<i64, ApiError> {
    let rows = exec.query_all(sql, params)?;
    Ok(rows.first().map(|r| r.get::<usize, i64>(0)).unwrap_or(0))
}

pub(crate) fn build_insert_sql(table: &str, columns: &[(&'static str, FieldValue)]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES RETURNING *");
    }
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING *",
        names.join(", "),
        placeholders.join(", ")
    )
}

pub(crate) fn build_update_sql(table: &str, columns: &[(&'static str, FieldValue)]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{name} = ${}", i + 1))
        .collect();
    format!(
        "UPDATE {table} SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ${} RETURNING *",
        assignments.join(", "),
        columns.len() + 1
    )
}

/// Replace embedded FK scalars with the referenced rows, one batch query per
/// embed field.
fn load_embeds(
    exec: &dyn DbExecutor,
    def: &'static EntityDef,
    items: &mut [Value],
) -> Result<(), ApiError> {
    for field in def.embedded_fields() {
        let reference = match &field.references {
            Some(r) => r,
            None => continue,
        };
        let mut ids: Vec<i64> = items
            .iter()
            .filter_map(|item| item.get(field.name).and_then(Value::as_i64))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let mut loaded: HashMap<i64, Value> = HashMap::new();
        if !ids.is_empty() {
            let target = registry()
                .iter()
                .find(|d| d.table == reference.table)
                .copied()
                .ok_or_else(|| {
                    ApiError::Db(crate::db::DbError::Other(format!(
                        "unknown reference table {}",
                        reference.table
                    )))
                })?;
            let (sql, values) = Query::select()
                .column(Asterisk)
                .from(Alias::new(reference.table))
                .and_where(Expr::col("id").is_in(ids))
                .build(PostgresQueryBuilder);
            let rows = with_bound_params(&values, |params| exec.query_all(&sql, params))?;
            for row in rows {
                let value = resource::row_to_value(target, &row)?;
                if let Some(id) = value.get("id").and_then(Value::as_i64) {
                    loaded.insert(id, value);
                }
            }
        }

        for item in items.iter_mut() {
            let id = item.get(field.name).and_then(Value::as_i64);
            let embed = id.and_then(|id| loaded.get(&id).cloned());
            resource::apply_embed(item, field.name, embed);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockExecutor;
    use crate::entity::personnel::Employee;
    use crate::entity::sales::Country;
    use serde_json::json;

    fn cfg() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn insert_sql_lists_validated_columns_only() {
        let sql = build_insert_sql(
            "employees",
            &[
                ("first_name", FieldValue::Text(Some("Anna".into()))),
                ("active", FieldValue::Boolean(Some(true))),
            ],
        );
        assert_eq!(
            sql,
            "INSERT INTO employees (first_name, active) VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(
            build_insert_sql("genders", &[]),
            "INSERT INTO genders DEFAULT VALUES RETURNING *"
        );
    }

    #[test]
    fn update_sql_touches_only_provided_fields() {
        let sql = build_update_sql(
            "employees",
            &[("city", FieldValue::Text(Some("Hamburg".into())))],
        );
        assert_eq!(
            sql,
            "UPDATE employees SET city = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *"
        );
    }

    #[test]
    fn invalid_create_issues_no_insert() {
        let exec = MockExecutor::new();
        let controller = ResourceController::<Employee>::new();
        let payload = json!({"email": "broken"}).as_object().cloned().unwrap();
        let err = controller.create(&exec, &payload).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(exec.sql().iter().all(|sql| !sql.contains("INSERT")));
    }

    #[test]
    fn list_on_empty_table_yields_empty_collection() {
        let exec = MockExecutor::new();
        let controller = ResourceController::<Country>::new();
        let env = controller
            .list(&exec, &cfg(), "/api/countries", PageQuery::default(), None)
            .unwrap();
        assert_eq!(env["meta"]["total"], 0);
        assert_eq!(env["data"].as_array().unwrap().len(), 0);

        let sql = exec.sql();
        assert!(sql[0].contains("COUNT(*)"));
        assert!(sql[1].contains("ORDER BY"));
        assert!(sql[1].contains("LIMIT"));
    }

    #[test]
    fn extreme_page_numbers_fall_back_to_first_page() {
        assert_eq!(resolve_page(Some(u64::MAX), 5), (1, 0));
        assert_eq!(resolve_page(Some(u64::MAX / 2), 100), (1, 0));
        assert_eq!(resolve_page(Some(3), 5), (3, 10));
        assert_eq!(resolve_page(None, 5), (1, 0));
        assert_eq!(resolve_page(Some(0), 5), (1, 0));

        let exec = MockExecutor::new();
        let controller = ResourceController::<Country>::new();
        let page = PageQuery {
            page: Some(u64::MAX),
            per_page: Some(5),
        };
        let env = controller
            .list(&exec, &cfg(), "/api/countries", page, None)
            .unwrap();
        assert_eq!(env["meta"]["current_page"], 1);
    }

    #[test]
    fn vanished_row_on_update_maps_to_not_found() {
        let err = map_write_error(
            crate::db::DbError::Query("query returned no rows".into()),
            "employees",
        );
        assert!(matches!(err, ApiError::NotFound));

        // other driver errors still classify normally
        let err = map_write_error(
            crate::db::DbError::Query(
                "db error: ERROR: duplicate key value violates unique constraint \"uq_employees_email\""
                    .into(),
            ),
            "employees",
        );
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn get_missing_row_is_not_found() {
        let exec = MockExecutor::new();
        let controller = ResourceController::<Country>::new();
        assert!(matches!(
            controller.get(&exec, 99).unwrap_err(),
            ApiError::NotFound
        ));
    }

    #[test]
    fn delete_missing_row_is_not_found() {
        let exec = MockExecutor::new();
        exec.execute_results.lock().unwrap().push(0);
        let controller = ResourceController::<Country>::new();
        assert!(matches!(
            controller.delete(&exec, 99).unwrap_err(),
            ApiError::NotFound
        ));
    }

    #[test]
    fn delete_existing_row_succeeds() {
        let exec = MockExecutor::new();
        let controller = ResourceController::<Country>::new();
        controller.delete(&exec, 1).unwrap();
        assert_eq!(exec.sql(), vec!["DELETE FROM countries WHERE id = $1"]);
    }

    #[test]
    fn update_missing_row_is_not_found_before_validation() {
        let exec = MockExecutor::new();
        let controller = ResourceController::<Employee>::new();
        let payload = json!({"email": "broken"}).as_object().cloned().unwrap();
        assert!(matches!(
            controller.update(&exec, 4, &payload).unwrap_err(),
            ApiError::NotFound
        ));
        // only the existence probe ran
        assert_eq!(exec.sql().len(), 1);
    }
}
