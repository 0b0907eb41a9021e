//! In-process stand-ins for the storage a real resource would talk to

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::Fault;
use crate::http::ApiResponse;

/// Records keyed by resource and id, ids counting up from 1
#[derive(Debug, Default)]
pub struct RecordStore {
    next_id: AtomicU64,
    rows: Mutex<BTreeMap<(String, u64), Value>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, resource: &str, record: Value) -> Result<u64, Fault> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows
            .lock()
            .map_err(|_| Fault::internal("record store lock poisoned"))?
            .insert((resource.to_string(), id), record);
        Ok(id)
    }

    pub fn get(&self, resource: &str, id: u64) -> Option<Value> {
        self.rows
            .lock()
            .ok()?
            .get(&(resource.to_string(), id))
            .cloned()
    }
}

/// A handle obtained from [`ConnectionPool::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub id: u64,
}

/// Hands out numbered connections until closed
#[derive(Debug, Default)]
pub struct ConnectionPool {
    opened: AtomicU64,
    closed: AtomicBool,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with 503 once the pool is closed
    pub fn connect(&self) -> Result<Connection, Fault> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ApiResponse::with_status_body(503, "Backend unavailable").into());
        }
        Ok(Connection {
            id: self.opened.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }
}
