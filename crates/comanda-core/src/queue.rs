//! # Order Queue (kitchen)
//!
//! Working set of active comandas on the kitchen display.
//!
//! ## Queue Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Order Queue Operations                           │
//! │                                                                     │
//! │  Push event              Queue method            State change       │
//! │  ──────────              ────────────            ────────────       │
//! │  NewOrder ─────────────► ingest() ─────────────► prepend ticket     │
//! │                                                  (dup id: no-op)    │
//! │                                                                     │
//! │  Staff action                                                       │
//! │  ────────────                                                       │
//! │  Tap state ────────────► toggle_state() ───────► Preparing↔Done     │
//! │  Edit note ────────────► edit_note() ──────────► every line         │
//! │  Delete ───────────────► remove() ─────────────► drop ticket        │
//! │  Clear screen ─────────► clear() ──────────────► empty queue        │
//! │                                                                     │
//! │  Orders are NEVER removed automatically; only staff action          │
//! │  clears them.                                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No network failures can reach this component; it only reacts to
//! already-delivered events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{OrderLine, OrderNotice, OrderState};

// =============================================================================
// Ticket
// =============================================================================

/// A comanda as it lives on the kitchen display.
///
/// `arrived_at` is assigned locally at first observation and used only
/// for the elapsed-time label; it is not authoritative and never sent
/// upstream.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub order_id: String,

    pub table_number: u32,

    pub items: Vec<OrderLine>,

    pub state: OrderState,

    #[ts(as = "String")]
    pub arrived_at: DateTime<Utc>,
}

impl Ticket {
    /// Builds a ticket from a validated push notice at ingestion time.
    pub fn from_notice(notice: OrderNotice, now: DateTime<Utc>) -> Self {
        Ticket {
            order_id: notice.order_id,
            table_number: notice.table_number,
            items: notice.items,
            state: OrderState::Preparing,
            arrived_at: now,
        }
    }

    /// Whole minutes since arrival, floored, with a distinct sentinel
    /// for sub-minute ages.
    ///
    /// `"<1 min"` must render differently from `"0 min"`: a ticket ten
    /// seconds old is "just in", not "zero minutes stale". Clock skew
    /// (arrival in the future) clamps to the sentinel too.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use comanda_core::queue::Ticket;
    /// use comanda_core::types::OrderNotice;
    ///
    /// let now = Utc::now();
    /// let ticket = Ticket::from_notice(
    ///     OrderNotice { order_id: "1".into(), table_number: 3, items: vec![] },
    ///     now,
    /// );
    /// assert_eq!(ticket.elapsed_label(now + Duration::seconds(30)), "<1 min");
    /// assert_eq!(ticket.elapsed_label(now + Duration::minutes(7)), "7 min");
    /// ```
    pub fn elapsed_label(&self, now: DateTime<Utc>) -> String {
        let mins = (now - self.arrived_at).num_minutes().max(0);
        if mins == 0 {
            "<1 min".to_string()
        } else {
            format!("{} min", mins)
        }
    }
}

// =============================================================================
// Order Queue
// =============================================================================

/// The kitchen's queue of active comandas, most recent first.
///
/// ## Invariants
/// - `order_id` is unique within the queue (duplicate arrivals of the
///   same id are idempotent no-ops)
/// - Ingestion never reorders existing tickets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueue {
    tickets: Vec<Ticket>,
}

impl OrderQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        OrderQueue {
            tickets: Vec::new(),
        }
    }

    /// Ingests a new-order notice at the head of the queue.
    ///
    /// ## Behavior
    /// - Duplicate `order_id`: no-op, returns false. The existing
    ///   ticket keeps its state and arrival time.
    /// - Missing `order_id` (empty after trim): dropped silently,
    ///   returns false.
    /// - Otherwise: prepends a Preparing ticket stamped `now`, returns
    ///   true.
    pub fn ingest(&mut self, notice: OrderNotice, now: DateTime<Utc>) -> bool {
        if notice.order_id.trim().is_empty() {
            return false;
        }
        if self.tickets.iter().any(|t| t.order_id == notice.order_id) {
            return false;
        }

        self.tickets.insert(0, Ticket::from_notice(notice, now));
        true
    }

    /// Flips Preparing↔Done on the matching ticket.
    ///
    /// Returns false (queue unchanged) when the id is absent.
    pub fn toggle_state(&mut self, order_id: &str) -> bool {
        match self.tickets.iter_mut().find(|t| t.order_id == order_id) {
            Some(ticket) => {
                ticket.state = ticket.state.toggled();
                true
            }
            None => false,
        }
    }

    /// Overwrites the note of EVERY line of the ticket with one shared
    /// value.
    ///
    /// The whole ticket shares a single editable note field at the UI
    /// level; an empty note clears all lines. Returns false when the id
    /// is absent.
    pub fn edit_note(&mut self, order_id: &str, note: &str) -> bool {
        let Some(ticket) = self.tickets.iter_mut().find(|t| t.order_id == order_id) else {
            return false;
        };

        let note = (!note.is_empty()).then(|| note.to_string());
        for item in &mut ticket.items {
            item.note = note.clone();
        }
        true
    }

    /// Removes the ticket with the given id.
    ///
    /// Idempotent: removing an absent id is a no-op (returns false),
    /// not an error.
    pub fn remove(&mut self, order_id: &str) -> bool {
        let before = self.tickets.len();
        self.tickets.retain(|t| t.order_id != order_id);
        self.tickets.len() != before
    }

    /// Empties the queue ("clear screen").
    pub fn clear(&mut self) {
        self.tickets.clear();
    }

    /// Tickets, most recent first.
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Looks up a ticket by id.
    pub fn get(&self, order_id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.order_id == order_id)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::OrderLine;
    use chrono::Duration;

    fn notice(id: &str, table: u32) -> OrderNotice {
        OrderNotice {
            order_id: id.to_string(),
            table_number: table,
            items: vec![
                OrderLine::new("Churrasco", 1, Money::from_minor(5000)),
                OrderLine::new("Jugo natural", 2, Money::from_minor(1500)),
            ],
        }
    }

    #[test]
    fn test_ingest_prepends_and_stamps() {
        let mut queue = OrderQueue::new();
        let now = Utc::now();

        assert!(queue.ingest(notice("a", 3), now));
        assert!(queue.ingest(notice("b", 5), now));

        assert_eq!(queue.len(), 2);
        // Most recent first
        assert_eq!(queue.tickets()[0].order_id, "b");
        assert_eq!(queue.tickets()[1].order_id, "a");
        assert_eq!(queue.tickets()[0].state, OrderState::Preparing);
        assert_eq!(queue.tickets()[0].arrived_at, now);
    }

    #[test]
    fn test_reingest_same_id_is_noop() {
        let mut queue = OrderQueue::new();
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);

        assert!(queue.ingest(notice("a", 3), t0));
        queue.toggle_state("a");

        // Duplicate delivery: length unchanged, state and arrival kept
        assert!(!queue.ingest(notice("a", 3), t1));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.tickets()[0].state, OrderState::Done);
        assert_eq!(queue.tickets()[0].arrived_at, t0);
    }

    #[test]
    fn test_ingest_drops_missing_order_id() {
        let mut queue = OrderQueue::new();
        let mut bad = notice("", 3);
        assert!(!queue.ingest(bad.clone(), Utc::now()));

        bad.order_id = "   ".to_string();
        assert!(!queue.ingest(bad, Utc::now()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_toggle_state_roundtrip_and_absent() {
        let mut queue = OrderQueue::new();
        queue.ingest(notice("a", 3), Utc::now());

        assert!(queue.toggle_state("a"));
        assert_eq!(queue.get("a").unwrap().state, OrderState::Done);
        assert!(queue.toggle_state("a"));
        assert_eq!(queue.get("a").unwrap().state, OrderState::Preparing);

        // Absent id: no-op, no error
        assert!(!queue.toggle_state("ghost"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_edit_note_overwrites_every_line() {
        let mut queue = OrderQueue::new();
        queue.ingest(notice("a", 3), Utc::now());

        assert!(queue.edit_note("a", "sin cebolla"));
        let ticket = queue.get("a").unwrap();
        assert!(ticket
            .items
            .iter()
            .all(|i| i.note.as_deref() == Some("sin cebolla")));

        // Empty note clears all lines
        assert!(queue.edit_note("a", ""));
        assert!(queue.get("a").unwrap().items.iter().all(|i| i.note.is_none()));

        assert!(!queue.edit_note("ghost", "x"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut queue = OrderQueue::new();
        queue.ingest(notice("a", 3), Utc::now());

        assert!(queue.remove("a"));
        assert!(!queue.remove("a"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = OrderQueue::new();
        queue.ingest(notice("a", 3), Utc::now());
        queue.ingest(notice("b", 4), Utc::now());

        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_elapsed_label() {
        let now = Utc::now();
        let ticket = Ticket::from_notice(notice("a", 3), now);

        assert_eq!(ticket.elapsed_label(now), "<1 min");
        assert_eq!(ticket.elapsed_label(now + Duration::seconds(59)), "<1 min");
        assert_eq!(ticket.elapsed_label(now + Duration::seconds(60)), "1 min");
        assert_eq!(ticket.elapsed_label(now + Duration::minutes(17)), "17 min");
        // Clock skew clamps to the sentinel instead of going negative
        assert_eq!(ticket.elapsed_label(now - Duration::minutes(2)), "<1 min");
    }
}
