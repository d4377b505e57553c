//! Explicit route table.
//!
//! Built once at startup from the entity registry; no reflection, no
//! containers. Paths look like `/api/{resource}`, `/api/{resource}/{id}`,
//! `/api/{resource}/methods` and `/api/{parent}/{id}/{child}`.

use crate::controller::PageQuery;
use crate::entity::{ChildDef, EntityDef};
use crate::error::ApiError;
use std::collections::HashMap;

#[derive(Debug)]
pub enum Route {
    List(&'static EntityDef),
    Get(&'static EntityDef, i64),
    Create(&'static EntityDef),
    Update(&'static EntityDef, i64),
    Delete(&'static EntityDef, i64),
    Methods(&'static EntityDef),
    ChildList(&'static EntityDef, i64, &'static ChildDef),
}

pub struct Router {
    by_path: HashMap<&'static str, &'static EntityDef>,
}

impl Router {
    pub fn new(defs: &[&'static EntityDef]) -> Self {
        let by_path = defs.iter().map(|d| (d.path, *d)).collect();
        Router { by_path }
    }

    /// Resolve method + path (query string already stripped) to a route.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown paths and non-numeric ids,
    /// `ApiError::MethodNotAllowed` for known paths with unsupported verbs.
    pub fn resolve(&self, method: &str, path: &str) -> Result<Route, ApiError> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next() != Some("api") {
            return Err(ApiError::NotFound);
        }
        let resource = segments.next().ok_or(ApiError::NotFound)?;
        let def = *self.by_path.get(resource).ok_or(ApiError::NotFound)?;

        let second = segments.next();
        let third = segments.next();
        if segments.next().is_some() {
            return Err(ApiError::NotFound);
        }

        match (second, third) {
            (None, _) => match method {
                "GET" => Ok(Route::List(def)),
                "POST" => Ok(Route::Create(def)),
                _ => Err(ApiError::MethodNotAllowed),
            },
            (Some("methods"), None) => match method {
                "GET" => Ok(Route::Methods(def)),
                _ => Err(ApiError::MethodNotAllowed),
            },
            (Some(id), None) => {
                let id: i64 = id.parse().map_err(|_| ApiError::NotFound)?;
                match method {
                    "GET" => Ok(Route::Get(def, id)),
                    "PUT" => Ok(Route::Update(def, id)),
                    "DELETE" => Ok(Route::Delete(def, id)),
                    _ => Err(ApiError::MethodNotAllowed),
                }
            }
            (Some(id), Some(child_segment)) => {
                let id: i64 = id.parse().map_err(|_| ApiError::NotFound)?;
                let child = def
                    .children
                    .iter()
                    .find(|c| c.segment == child_segment)
                    .ok_or(ApiError::NotFound)?;
                match method {
                    "GET" => Ok(Route::ChildList(def, id, child)),
                    _ => Err(ApiError::MethodNotAllowed),
                }
            }
        }
    }
}

/// Parse `page`/`per_page` from a raw query string. Malformed values fall
/// back to defaults rather than erroring.
pub fn parse_page_query(query: &str) -> PageQuery {
    let mut page = PageQuery::default();
    for pair in query.split('&') {
        let mut kv = pair.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("page"), Some(v)) => page.page = v.parse().ok(),
            (Some("per_page"), Some(v)) => page.per_page = v.parse().ok(),
            _ => {}
        }
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::registry;

    fn router() -> Router {
        Router::new(registry())
    }

    #[test]
    fn resolves_collection_routes() {
        let r = router();
        assert!(matches!(r.resolve("GET", "/api/employees"), Ok(Route::List(d)) if d.table == "employees"));
        assert!(matches!(r.resolve("POST", "/api/promoter-groups"), Ok(Route::Create(d)) if d.table == "promoter_groups"));
    }

    #[test]
    fn resolves_item_routes() {
        let r = router();
        assert!(matches!(r.resolve("GET", "/api/events/7"), Ok(Route::Get(_, 7))));
        assert!(matches!(r.resolve("PUT", "/api/events/7"), Ok(Route::Update(_, 7))));
        assert!(matches!(r.resolve("DELETE", "/api/events/7"), Ok(Route::Delete(_, 7))));
    }

    #[test]
    fn methods_route_wins_over_id() {
        let r = router();
        assert!(matches!(
            r.resolve("GET", "/api/countries/methods"),
            Ok(Route::Methods(d)) if d.table == "countries"
        ));
    }

    #[test]
    fn resolves_child_routes() {
        let r = router();
        assert!(matches!(
            r.resolve("GET", "/api/customers/3/contact-persons"),
            Ok(Route::ChildList(d, 3, c)) if d.table == "customers" && c.child_table == "contact_persons"
        ));
        assert!(matches!(
            r.resolve("GET", "/api/groups/1/users"),
            Ok(Route::ChildList(_, 1, c)) if c.via.is_some()
        ));
    }

    #[test]
    fn unknown_paths_are_not_found() {
        let r = router();
        assert!(matches!(r.resolve("GET", "/api/unicorns"), Err(ApiError::NotFound)));
        assert!(matches!(r.resolve("GET", "/health"), Err(ApiError::NotFound)));
        assert!(matches!(r.resolve("GET", "/api/employees/abc"), Err(ApiError::NotFound)));
        assert!(matches!(
            r.resolve("GET", "/api/customers/1/unknown"),
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            r.resolve("GET", "/api/customers/1/contact-persons/2"),
            Err(ApiError::NotFound)
        ));
    }

    #[test]
    fn wrong_verbs_are_method_not_allowed() {
        let r = router();
        assert!(matches!(
            r.resolve("PATCH", "/api/employees/1"),
            Err(ApiError::MethodNotAllowed)
        ));
        assert!(matches!(
            r.resolve("DELETE", "/api/employees"),
            Err(ApiError::MethodNotAllowed)
        ));
        assert!(matches!(
            r.resolve("POST", "/api/customers/1/contact-persons"),
            Err(ApiError::MethodNotAllowed)
        ));
    }

    #[test]
    fn page_query_parsing_is_lenient() {
        let q = parse_page_query("page=2&per_page=10");
        assert_eq!(q.page, Some(2));
        assert_eq!(q.per_page, Some(10));

        let q = parse_page_query("page=abc&per_page=");
        assert_eq!(q.page, None);
        assert_eq!(q.per_page, None);

        let q = parse_page_query("");
        assert_eq!(q.page, None);
    }
}
