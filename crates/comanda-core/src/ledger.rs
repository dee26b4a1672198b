//! # Table Ledger (cashier)
//!
//! Fixed-cardinality registry of tables, reconciled from pushed
//! snapshots of aggregate per-table totals.
//!
//! ## Reconciliation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                Full-Replace Reconciliation                          │
//! │                                                                     │
//! │  snapshot: [{table 3, $12.500}, {table 7, $8.000, settled}]         │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  reconcile() rebuilds ALL N entries from scratch:                   │
//! │                                                                     │
//! │    table 1  → absent  → Free   / $0                                 │
//! │    table 2  → absent  → Free   / $0                                 │
//! │    table 3  → present → Occupied / $12.500   (status defaulted)     │
//! │    ...                                                              │
//! │    table 7  → present → Settled  / $8.000                           │
//! │    ...                                                              │
//! │    table N  → absent  → Free   / $0                                 │
//! │                                                                     │
//! │  Never an incremental merge: a table the server stopped             │
//! │  reporting returned to empty, so stale entries cannot survive       │
//! │  a reconcile call.                                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::TableStatus;

// =============================================================================
// Snapshot Entry
// =============================================================================

/// One table's aggregate in a pushed totals snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TableTotal {
    pub table_id: u32,

    pub total: Money,

    /// Omitted by older servers; defaulted from the total on
    /// reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
}

// =============================================================================
// Table Entry
// =============================================================================

/// Local display state of one table on the cashier grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TableEntry {
    pub table_id: u32,

    pub total: Money,

    pub status: TableStatus,
}

impl TableEntry {
    fn free(table_id: u32) -> Self {
        TableEntry {
            table_id,
            total: Money::zero(),
            status: TableStatus::Free,
        }
    }
}

// =============================================================================
// Table Ledger
// =============================================================================

/// The cashier's table grid.
///
/// ## Invariants
/// - Exactly `table_count` entries at all times, sorted ascending by
///   `table_id`; no partial views
/// - Cardinality is fixed at startup; tables are never added or removed
///   at runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLedger {
    tables: Vec<TableEntry>,
}

impl TableLedger {
    /// Creates a ledger of `table_count` tables, all Free at zero.
    pub fn new(table_count: u32) -> Self {
        TableLedger {
            tables: (1..=table_count).map(TableEntry::free).collect(),
        }
    }

    /// Number of tables in the grid.
    pub fn table_count(&self) -> u32 {
        self.tables.len() as u32
    }

    /// Applies a pushed totals snapshot, replacing the whole view.
    ///
    /// ## Behavior
    /// - Present entry: total applied; omitted status defaults to
    ///   Occupied when the total is nonzero, Free when zero
    /// - Absent table: forced to Free/$0, never left stale
    /// - Entries with a `table_id` outside 1..=N are ignored
    ///
    /// Idempotent: re-applying the same snapshot yields the same view.
    pub fn reconcile(&mut self, snapshot: &[TableTotal]) {
        let count = self.tables.len() as u32;
        self.tables = (1..=count)
            .map(|id| match snapshot.iter().find(|s| s.table_id == id) {
                Some(entry) => {
                    let status = entry.status.unwrap_or(if entry.total.is_positive() {
                        TableStatus::Occupied
                    } else {
                        TableStatus::Free
                    });
                    TableEntry {
                        table_id: id,
                        total: entry.total,
                        status,
                    }
                }
                None => TableEntry::free(id),
            })
            .collect();
    }

    /// Optimistically frees a table right after a local settlement,
    /// independent of the next snapshot.
    ///
    /// Idempotent. A snapshot computed before the commit may transiently
    /// re-occupy the table until the next one arrives; that bounded
    /// window is accepted (the snapshot stream is authoritative).
    pub fn mark_settled(&mut self, table_id: u32) {
        if let Some(entry) = self.tables.iter_mut().find(|t| t.table_id == table_id) {
            entry.total = Money::zero();
            entry.status = TableStatus::Free;
        }
    }

    /// The full grid, always exactly N entries in ascending table order.
    pub fn entries(&self) -> &[TableEntry] {
        &self.tables
    }

    /// Looks up one table.
    pub fn get(&self, table_id: u32) -> Option<&TableEntry> {
        self.tables.iter().find(|t| t.table_id == table_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn total(table_id: u32, minor: i64) -> TableTotal {
        TableTotal {
            table_id,
            total: Money::from_minor(minor),
            status: None,
        }
    }

    #[test]
    fn test_new_ledger_all_free() {
        let ledger = TableLedger::new(19);
        assert_eq!(ledger.entries().len(), 19);
        assert!(ledger
            .entries()
            .iter()
            .all(|t| t.status == TableStatus::Free && t.total.is_zero()));
        // Ascending table ids
        assert_eq!(ledger.entries()[0].table_id, 1);
        assert_eq!(ledger.entries()[18].table_id, 19);
    }

    #[test]
    fn test_reconcile_full_replace() {
        let mut ledger = TableLedger::new(19);

        ledger.reconcile(&[total(3, 12500), total(7, 8000)]);

        assert_eq!(ledger.get(3).unwrap().total.minor(), 12500);
        assert_eq!(ledger.get(3).unwrap().status, TableStatus::Occupied);
        assert_eq!(ledger.get(7).unwrap().total.minor(), 8000);
        assert_eq!(ledger.get(1).unwrap().status, TableStatus::Free);

        // Table 3 absent from the next snapshot: forced back to Free/0,
        // not left stale
        ledger.reconcile(&[total(7, 9500)]);
        assert_eq!(ledger.get(3).unwrap().total.minor(), 0);
        assert_eq!(ledger.get(3).unwrap().status, TableStatus::Free);
        assert_eq!(ledger.get(7).unwrap().total.minor(), 9500);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut ledger = TableLedger::new(5);
        let snapshot = vec![total(2, 4000)];

        ledger.reconcile(&snapshot);
        let first = ledger.entries().to_vec();
        ledger.reconcile(&snapshot);
        assert_eq!(ledger.entries(), first.as_slice());
    }

    #[test]
    fn test_reconcile_empty_snapshot_frees_everything() {
        let mut ledger = TableLedger::new(5);
        ledger.reconcile(&[total(1, 100), total(2, 200)]);

        ledger.reconcile(&[]);
        assert!(ledger
            .entries()
            .iter()
            .all(|t| t.status == TableStatus::Free && t.total.is_zero()));
    }

    #[test]
    fn test_reconcile_status_defaults() {
        let mut ledger = TableLedger::new(5);

        // Explicit status wins
        ledger.reconcile(&[TableTotal {
            table_id: 4,
            total: Money::from_minor(8000),
            status: Some(TableStatus::Settled),
        }]);
        assert_eq!(ledger.get(4).unwrap().status, TableStatus::Settled);

        // Omitted status with a zero total reads as Free
        ledger.reconcile(&[total(4, 0)]);
        assert_eq!(ledger.get(4).unwrap().status, TableStatus::Free);
    }

    #[test]
    fn test_reconcile_ignores_out_of_range_ids() {
        let mut ledger = TableLedger::new(5);
        ledger.reconcile(&[total(0, 100), total(6, 200), total(99, 300)]);

        assert_eq!(ledger.entries().len(), 5);
        assert!(ledger.entries().iter().all(|t| t.total.is_zero()));
    }

    #[test]
    fn test_mark_settled_is_idempotent() {
        let mut ledger = TableLedger::new(5);
        ledger.reconcile(&[total(2, 4000)]);

        ledger.mark_settled(2);
        assert_eq!(ledger.get(2).unwrap().status, TableStatus::Free);
        assert!(ledger.get(2).unwrap().total.is_zero());

        ledger.mark_settled(2);
        assert_eq!(ledger.get(2).unwrap().status, TableStatus::Free);

        // Unknown table id is a no-op
        ledger.mark_settled(42);
        assert_eq!(ledger.entries().len(), 5);
    }

    #[test]
    fn test_settle_race_with_stale_snapshot() {
        let mut ledger = TableLedger::new(5);
        ledger.reconcile(&[total(2, 5000)]);

        // Local optimistic settle...
        ledger.mark_settled(2);
        assert_eq!(ledger.get(2).unwrap().status, TableStatus::Free);

        // ...raced by a snapshot computed before the commit. The stale
        // total transiently re-occupies the table; accepted window.
        ledger.reconcile(&[total(2, 5000)]);
        assert_eq!(ledger.get(2).unwrap().status, TableStatus::Occupied);
        assert_eq!(ledger.get(2).unwrap().total.minor(), 5000);

        // The next snapshot without the table restores Free/0
        ledger.reconcile(&[]);
        assert_eq!(ledger.get(2).unwrap().status, TableStatus::Free);
        assert!(ledger.get(2).unwrap().total.is_zero());
    }
}
