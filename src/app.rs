//! Application assembly.
//!
//! Everything is wired explicitly at startup: one controller per entity,
//! keyed by table name, plus the route table and the shared client pool.
//! There is no container and no global mutable state.

use crate::config::AppConfig;
use crate::controller::{ResourceController, ResourceHandler};
use crate::db::{DbError, Pool};
use crate::entity::{access, events, inventory, personnel, promoters, registry, sales, time};
use crate::error::ApiError;
use crate::router::Router;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide fixed-window request budget. A limit of 0 disables it.
pub struct RateLimiter {
    limit: u64,
    window: Mutex<(u64, u64)>,
}

impl RateLimiter {
    pub fn new(limit: u64) -> Self {
        RateLimiter {
            limit,
            window: Mutex::new((0, 0)),
        }
    }

    pub fn allow(&self) -> bool {
        if self.limit == 0 {
            return true;
        }
        let minute = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() / 60)
            .unwrap_or(0);
        let mut window = match self.window.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        if window.0 != minute {
            *window = (minute, 0);
        }
        if window.1 >= self.limit {
            return false;
        }
        window.1 += 1;
        true
    }
}

pub struct App {
    pub config: AppConfig,
    pub pool: Pool,
    pub router: Router,
    pub rate_limiter: RateLimiter,
    handlers: HashMap<&'static str, Box<dyn ResourceHandler>>,
}

impl App {
    pub fn new(config: AppConfig, pool: Pool) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_per_minute);
        App {
            config,
            pool,
            router: Router::new(registry()),
            rate_limiter,
            handlers: build_handlers(),
        }
    }

    /// Controller for a table. Every registered entity has one.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the table has no controller; the registry
    /// test pins this down at build time.
    pub fn handler(&self, table: &str) -> Result<&dyn ResourceHandler, ApiError> {
        self.handlers
            .get(table)
            .map(Box::as_ref)
            .ok_or_else(|| ApiError::Db(DbError::Other(format!("no handler for table {table}"))))
    }
}

fn add<M: crate::entity::ResourceModel + 'static>(
    map: &mut HashMap<&'static str, Box<dyn ResourceHandler>>,
) {
    map.insert(M::DEF.table, Box::new(ResourceController::<M>::new()));
}

fn build_handlers() -> HashMap<&'static str, Box<dyn ResourceHandler>> {
    let mut map: HashMap<&'static str, Box<dyn ResourceHandler>> = HashMap::new();
    add::<personnel::Gender>(&mut map);
    add::<personnel::Department>(&mut map);
    add::<personnel::Occupation>(&mut map);
    add::<personnel::Skill>(&mut map);
    add::<personnel::ServiceArea>(&mut map);
    add::<personnel::Employee>(&mut map);
    add::<promoters::PromoterGroup>(&mut map);
    add::<promoters::Promoter>(&mut map);
    add::<events::EventState>(&mut map);
    add::<events::Location>(&mut map);
    add::<events::Event>(&mut map);
    add::<events::CommitmentState>(&mut map);
    add::<events::Commitment>(&mut map);
    add::<sales::Country>(&mut map);
    add::<sales::PriceGroup>(&mut map);
    add::<sales::Customer>(&mut map);
    add::<sales::ContactPerson>(&mut map);
    add::<sales::OfferState>(&mut map);
    add::<sales::Offer>(&mut map);
    add::<sales::PaymentState>(&mut map);
    add::<sales::Invoice>(&mut map);
    add::<inventory::InventoryCondition>(&mut map);
    add::<inventory::Inventory>(&mut map);
    add::<access::Permission>(&mut map);
    add::<access::User>(&mut map);
    add::<access::Group>(&mut map);
    add::<access::GroupUser>(&mut map);
    add::<access::GroupPermission>(&mut map);
    add::<time::TimeTrackingState>(&mut map);
    add::<time::TimeTrackingChannel>(&mut map);
    add::<time::TimeTracking>(&mut map);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entity_has_a_handler() {
        let handlers = build_handlers();
        for def in registry() {
            let handler = handlers
                .get(def.table)
                .unwrap_or_else(|| panic!("missing handler for {}", def.table));
            assert_eq!(handler.def().table, def.table);
        }
        assert_eq!(handlers.len(), registry().len());
    }

    #[test]
    fn rate_limiter_enforces_window_budget() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[test]
    fn zero_limit_disables_rate_limiting() {
        let limiter = RateLimiter::new(0);
        for _ in 0..1000 {
            assert!(limiter.allow());
        }
    }
}
