//! HTTP front end on the coroutine-per-request server.
//!
//! The service is a thin translation layer: parse method/path/body, hand the
//! request to the routed controller, and write the JSON envelope back. All
//! domain decisions live in the controllers; all failures funnel through
//! `ApiError` so status codes and bodies stay uniform.

use crate::app::App;
use crate::controller::ChildFilter;
use crate::error::ApiError;
use crate::resource;
use crate::router::{parse_page_query, Route};
use may_minihttp::{HttpService, Request, Response};
use serde_json::{Map, Value};
use std::io::{self, Read};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiService {
    pub app: Arc<App>,
}

enum Reply {
    Json(usize, &'static str, Value),
    NoContent,
}

impl ApiService {
    pub fn new(app: Arc<App>) -> Self {
        ApiService { app }
    }

    fn dispatch(&self, method: &str, path: &str, query: &str, body: &[u8]) -> Result<Reply, ApiError> {
        if !self.app.rate_limiter.allow() {
            return Err(ApiError::RateLimited);
        }
        let route = self.app.router.resolve(method, path)?;
        let exec = self.app.pool.executor();

        match route {
            Route::List(def) => {
                let handler = self.app.handler(def.table)?;
                let base = format!("/api/{}", def.path);
                let envelope = handler.list(&exec, &self.app.config, &base, parse_page_query(query), None)?;
                Ok(Reply::Json(200, "OK", envelope))
            }
            Route::Get(def, id) => {
                let handler = self.app.handler(def.table)?;
                let item = handler.get(&exec, id)?;
                Ok(Reply::Json(200, "OK", resource::data_envelope(item)))
            }
            Route::Create(def) => {
                let handler = self.app.handler(def.table)?;
                let payload = parse_payload(body)?;
                let item = handler.create(&exec, &payload)?;
                Ok(Reply::Json(201, "Created", resource::data_envelope(item)))
            }
            Route::Update(def, id) => {
                let handler = self.app.handler(def.table)?;
                let payload = parse_payload(body)?;
                let item = handler.update(&exec, id, &payload)?;
                Ok(Reply::Json(200, "OK", resource::data_envelope(item)))
            }
            Route::Delete(def, id) => {
                let handler = self.app.handler(def.table)?;
                handler.delete(&exec, id)?;
                Ok(Reply::NoContent)
            }
            Route::Methods(_) => Ok(Reply::Json(200, "OK", resource::methods_doc())),
            Route::ChildList(def, id, child) => {
                let parent = self.app.handler(def.table)?;
                if !parent.exists(&exec, id)? {
                    return Err(ApiError::NotFound);
                }
                let handler = self.app.handler(child.child_table)?;
                let filter = ChildFilter {
                    child,
                    parent_id: id,
                };
                let base = format!("/api/{}/{}/{}", def.path, id, child.segment);
                let envelope = handler.list(
                    &exec,
                    &self.app.config,
                    &base,
                    parse_page_query(query),
                    Some(&filter),
                )?;
                Ok(Reply::Json(200, "OK", envelope))
            }
        }
    }
}

impl HttpService for ApiService {
    fn call(&mut self, req: Request, rsp: &mut Response) -> io::Result<()> {
        let method = req.method().to_owned();
        let raw_path = req.path().to_owned();
        let (path, query) = match raw_path.split_once('?') {
            Some((p, q)) => (p, q),
            None => (raw_path.as_str(), ""),
        };

        let mut body = Vec::new();
        let mut reader = req.body();
        reader.read_to_end(&mut body)?;

        let outcome = self.dispatch(&method, path, query, &body);
        let (status, value) = match outcome {
            Ok(Reply::Json(code, reason, value)) => {
                rsp.status_code(code, reason);
                (code, Some(value))
            }
            Ok(Reply::NoContent) => {
                rsp.status_code(204, "No Content");
                (204, None)
            }
            Err(err) => {
                let status = err.status();
                if status >= 500 {
                    tracing::error!(%method, path, error = %err, "request failed");
                }
                rsp.status_code(status, err.reason());
                (status, Some(err.envelope(self.app.config.debug)))
            }
        };
        tracing::debug!(%method, path, status, "handled");

        if let Some(value) = value {
            rsp.header("Content-Type: application/json");
            serde_json::to_writer(rsp.body_mut(), &value)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        }
        Ok(())
    }
}

/// Decode a request body into the expected JSON object. An empty body is
/// treated as an empty object so required-field messages come back instead
/// of a parse error.
fn parse_payload(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_an_empty_object() {
        assert!(parse_payload(b"").unwrap().is_empty());
        assert!(parse_payload(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn object_bodies_parse() {
        let map = parse_payload(br#"{"name": "confirmed"}"#).unwrap();
        assert_eq!(map["name"], "confirmed");
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(matches!(
            parse_payload(b"[1, 2]").unwrap_err(),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            parse_payload(b"{broken").unwrap_err(),
            ApiError::BadRequest(_)
        ));
    }
}
