//! In-memory record store for bookswap.
//!
//! [`Store`] wraps the whole dataset behind one `RwLock`, so every closure passed
//! to [`Store::write`] is a unit of work: readers see either all of its changes
//! or none of them. [`LockTable`] adds per-key mutual exclusion for callers that
//! need to hold a key across several awaits (read, check, then commit).

mod locks;
mod table;

pub use locks::{KeyGuard, LockTable};
pub use table::Table;

use thiserror::Error;
use tokio::sync::RwLock;

/// Errors raised by record store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{table} record {id} not found")]
    NotFound { table: &'static str, id: u64 },

    #[error("{table} record {id} conflict: {reason}")]
    Conflict {
        table: &'static str,
        id: u64,
        reason: String,
    },
}

impl StoreError {
    pub fn not_found(table: &'static str, id: u64) -> Self {
        Self::NotFound { table, id }
    }

    pub fn conflict(table: &'static str, id: u64, reason: impl Into<String>) -> Self {
        Self::Conflict {
            table,
            id,
            reason: reason.into(),
        }
    }
}

/// Shared dataset guarded by a single reader/writer lock.
#[derive(Debug, Default)]
pub struct Store<S> {
    state: RwLock<S>,
}

impl<S> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Run a read-only query against a consistent snapshot.
    pub async fn read<R>(&self, query: impl FnOnce(&S) -> R) -> R {
        let guard = self.state.read().await;
        query(&guard)
    }

    /// Apply a unit of work. The closure must leave the state untouched when it
    /// returns an error; [`Table`] helpers are written so validation happens
    /// before mutation.
    pub async fn write<R>(&self, unit: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.state.write().await;
        unit(&mut guard)
    }
}
