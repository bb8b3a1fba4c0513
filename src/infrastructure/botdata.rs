use std::{
    collections::HashMap,
    sync::{RwLock, atomic::AtomicBool},
    time::Instant,
};

use sea_orm::DatabaseConnection;

pub struct Data {
    pub db_pool: DatabaseConnection,
    /// Start time of each in-flight command, keyed by invocation id.
    pub invoc_time: RwLock<HashMap<u64, Instant>>,
    pub started_at: Instant,
    pub stats_refresher_started: AtomicBool,
}

impl Data {
    pub fn new(db_pool: DatabaseConnection) -> Self {
        Self {
            db_pool,
            invoc_time: Default::default(),
            started_at: Instant::now(),
            stats_refresher_started: AtomicBool::new(false),
        }
    }
}
