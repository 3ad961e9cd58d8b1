//! In-memory entity store shared by every business module.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::activity::Activity;
use crate::billing::{Invoice, Payment};
use crate::catalog::Service;
use crate::config::StoreConfig;
use crate::customers::{Customer, Vehicle};
use crate::inventory::{InventoryItem, InventoryTransaction};
use crate::jobs::{Job, JobService};
use crate::memberships::{CustomerSubscription, MembershipPlan};
use crate::reviews::Review;
use crate::users::User;

pub mod error;

pub use error::StoreError;

/// Process-local identifier sequence. Starts at 1, never reuses a value,
/// not stable across restarts.
pub(crate) struct Sequence(AtomicI64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    pub(crate) fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// One keyed collection. Rows are cloned out so callers never hold the lock.
pub(crate) struct Table<T> {
    rows: RwLock<HashMap<i64, T>>,
    ids: Sequence,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            ids: Sequence::new(),
        }
    }

    pub(crate) async fn insert(&self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.ids.next();
        let row = build(id);
        self.rows.write().await.insert(id, row.clone());
        row
    }

    pub(crate) async fn get(&self, id: i64) -> Option<T> {
        self.rows.read().await.get(&id).cloned()
    }

    /// All rows in insertion order (ascending id).
    pub(crate) async fn all(&self) -> Vec<T> {
        let rows = self.rows.read().await;
        let mut entries: Vec<(&i64, &T)> = rows.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        entries.into_iter().map(|(_, row)| row.clone()).collect()
    }

    pub(crate) async fn modify(&self, id: i64, apply: impl FnOnce(&mut T)) -> Option<T> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id)?;
        apply(row);
        Some(row.clone())
    }

    pub(crate) async fn remove(&self, id: i64) -> bool {
        self.rows.write().await.remove(&id).is_some()
    }

    pub(crate) async fn remove_where(&self, matches: impl Fn(&T) -> bool) -> usize {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, row| !matches(row));
        before - rows.len()
    }
}

/// The storage and aggregation core. Constructed once at process start and
/// handed by `Arc` to whatever serves requests; every collection lives for
/// the lifetime of the process and nothing is persisted.
pub struct MemStore {
    pub(crate) config: StoreConfig,
    pub(crate) users: Table<User>,
    pub(crate) customers: Table<Customer>,
    pub(crate) vehicles: Table<Vehicle>,
    pub(crate) services: Table<Service>,
    pub(crate) jobs: Table<Job>,
    pub(crate) job_services: Table<JobService>,
    pub(crate) invoices: Table<Invoice>,
    pub(crate) payments: Table<Payment>,
    pub(crate) activities: Table<Activity>,
    pub(crate) reviews: Table<Review>,
    pub(crate) membership_plans: Table<MembershipPlan>,
    pub(crate) subscriptions: Table<CustomerSubscription>,
    pub(crate) inventory_items: Table<InventoryItem>,
    pub(crate) inventory_transactions: Table<InventoryTransaction>,
    pub(crate) invoice_numbers: AtomicU64,
}

impl MemStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            users: Table::new(),
            customers: Table::new(),
            vehicles: Table::new(),
            services: Table::new(),
            jobs: Table::new(),
            job_services: Table::new(),
            invoices: Table::new(),
            payments: Table::new(),
            activities: Table::new(),
            reviews: Table::new(),
            membership_plans: Table::new(),
            subscriptions: Table::new(),
            inventory_items: Table::new(),
            inventory_transactions: Table::new(),
            invoice_numbers: AtomicU64::new(1000),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
