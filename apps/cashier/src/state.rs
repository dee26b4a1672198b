//! # Ledger State
//!
//! Shared ownership wrapper around the cashier's [`TableLedger`].
//!
//! ## Thread Safety
//! The ledger is wrapped in `Arc<Mutex<T>>` because the bridge's
//! routing task reconciles snapshots into it while the command loop
//! reads it and the commit flow applies optimistic settles. All three
//! are quick synchronous mutations; the lock is never held across an
//! await.

use std::sync::{Arc, Mutex};

use comanda_core::TableLedger;

/// Shared handle to the cashier's table ledger.
#[derive(Debug, Clone)]
pub struct LedgerState {
    ledger: Arc<Mutex<TableLedger>>,
}

impl LedgerState {
    /// Creates a ledger of `table_count` tables, all Free at zero.
    pub fn new(table_count: u32) -> Self {
        LedgerState {
            ledger: Arc::new(Mutex::new(TableLedger::new(table_count))),
        }
    }

    /// Executes a function with read access to the ledger.
    pub fn with_ledger<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&TableLedger) -> R,
    {
        let ledger = self.ledger.lock().expect("ledger mutex poisoned");
        f(&ledger)
    }

    /// Executes a function with write access to the ledger.
    pub fn with_ledger_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut TableLedger) -> R,
    {
        let mut ledger = self.ledger.lock().expect("ledger mutex poisoned");
        f(&mut ledger)
    }
}
