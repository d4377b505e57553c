//! Data access layer: connection handling, the executor seam and typed
//! parameter binding.

pub mod connect;
pub mod executor;
pub mod params;
pub mod pool;

pub use connect::{connect, validate_connection_string, ConnectionError};
pub use executor::{DbError, DbExecutor, PgExecutor};
pub use params::{bind_slice, with_bound_params, FieldValue};
pub use pool::Pool;

#[cfg(test)]
pub use executor::MockExecutor;
