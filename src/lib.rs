//! # Promoplan
//!
//! Coroutine-native REST API for a promotion-staffing business: employees,
//! promoters, events, commitments, customers, offers, invoices, inventory,
//! access control and time tracking, persisted in PostgreSQL.
//!
//! Every resource exposes the same surface under `/api`:
//! list (paginated), get, create, update, delete and a `methods` document,
//! plus nested child listings such as `/api/customers/{id}/contact-persons`.
//! Requests are served on `may` coroutines with `may_postgres` connections;
//! the schema is created and seeded on startup.

pub mod app;
pub mod config;
pub mod controller;
pub mod db;
pub mod entity;
pub mod error;
pub mod http;
pub mod resource;
pub mod router;
pub mod schema;
pub mod validate;

pub use app::App;
pub use config::AppConfig;
pub use db::{DbError, DbExecutor, PgExecutor, Pool};
pub use error::ApiError;
pub use http::ApiService;
