//! Fixed-size client pool.
//!
//! `may_postgres` clients multiplex requests over one connection and clone
//! cheaply, so the pool is a plain round-robin over a fixed set of
//! connections opened at startup.

use super::connect::{connect, ConnectionError};
use super::executor::PgExecutor;
use may_postgres::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Pool {
    clients: Vec<Client>,
    next: AtomicUsize,
}

impl Pool {
    /// Open `size` connections against `url`, retrying the first connection
    /// until `timeout` elapses so the server can start alongside the database.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if any connection cannot be established
    /// within the timeout.
    pub fn connect(url: &str, size: usize, timeout: Duration) -> Result<Self, ConnectionError> {
        let size = size.max(1);
        let deadline = Instant::now() + timeout;
        let first = loop {
            match connect(url) {
                Ok(client) => break client,
                Err(err) if Instant::now() < deadline => {
                    tracing::warn!(error = %err, "database not ready, retrying");
                    std::thread::sleep(Duration::from_millis(500));
                }
                Err(err) => return Err(err),
            }
        };
        let mut clients = Vec::with_capacity(size);
        clients.push(first);
        for _ in 1..size {
            clients.push(connect(url)?);
        }
        tracing::info!(size, "database pool ready");
        Ok(Pool {
            clients,
            next: AtomicUsize::new(0),
        })
    }

    /// Borrow an executor for one request.
    pub fn executor(&self) -> PgExecutor {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        PgExecutor::new(self.clients[idx].clone())
    }
}
