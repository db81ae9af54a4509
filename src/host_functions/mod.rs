//! Host functions exposed to scripts.
//!
//! These functions are called from within the QuickJS context and give
//! scripts access to native capabilities. Every call is recorded in a
//! per-run ledger that enforces the configured call limit.

pub mod crypto;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Error raised by a native capability
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Key material missing or malformed
    #[error("Key material unavailable: {0}")]
    KeyMaterial(String),

    /// Existing keys were requested but no key store is configured
    #[error("No key store configured for loading existing keys")]
    NoKeyStore,

    /// Too many native calls in one run
    #[error("Resource limit exceeded: host calls (used: {used}, limit: {limit})")]
    ResourceLimit {
        /// Calls made including the rejected one
        used: u32,
        /// Configured limit
        limit: u32,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for host functions
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Per-run ledger of native method calls
#[derive(Debug)]
pub struct HostCalls {
    counts: RefCell<HashMap<String, u32>>,
    total: Cell<u32>,
    limit: u32,
}

/// Ledger shared between the engine and its bound closures
pub type SharedHostCalls = Rc<HostCalls>;

impl HostCalls {
    /// Create a ledger with the given call limit
    pub fn new(limit: u32) -> Self {
        Self {
            counts: RefCell::new(HashMap::new()),
            total: Cell::new(0),
            limit,
        }
    }

    /// Check the limit and count one call to `name`
    pub fn record(&self, name: &str) -> HostResult<()> {
        let used = self.total.get().saturating_add(1);
        if used > self.limit {
            return Err(HostError::ResourceLimit {
                used,
                limit: self.limit,
            });
        }

        self.total.set(used);
        *self.counts.borrow_mut().entry(name.to_string()).or_insert(0) += 1;
        Ok(())
    }

    /// Total calls recorded
    pub fn total(&self) -> u32 {
        self.total.get()
    }

    /// Per-method call counts
    pub fn snapshot(&self) -> HashMap<String, u32> {
        self.counts.borrow().clone()
    }
}
