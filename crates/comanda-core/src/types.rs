//! # Domain Types
//!
//! Core domain types shared by the kitchen and cashier stations.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │  OrderNotice   │   │  OrderDetail   │   │ PaymentRequest │      │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │      │
//! │  │  push event:   │   │  fetched for   │   │  commit payload│      │
//! │  │  new comanda   │   │  settlement    │   │  to service    │      │
//! │  └────────────────┘   └────────────────┘   └────────────────┘      │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │   OrderState   │   │  TableStatus   │   │ PaymentMethod  │      │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │      │
//! │  │  Preparing     │   │  Free          │   │  Debit         │      │
//! │  │  Done          │   │  Occupied      │   │  Credit        │      │
//! │  └────────────────┘   │  Settled       │   │  Cash          │      │
//! │                       └────────────────┘   └────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Order ids are opaque, server-assigned strings; the core never parses
//! or generates them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Order State
// =============================================================================

/// Kitchen-side preparation state of a comanda.
///
/// Mutated only by kitchen staff action; never confirmed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Order is being prepared.
    Preparing,
    /// Kitchen marked the order ready.
    Done,
}

impl OrderState {
    /// Returns the other state (Preparing↔Done).
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            OrderState::Preparing => OrderState::Done,
            OrderState::Done => OrderState::Preparing,
        }
    }
}

impl Default for OrderState {
    fn default() -> Self {
        OrderState::Preparing
    }
}

// =============================================================================
// Table Status
// =============================================================================

/// Occupancy state of a table as shown on the cashier grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// No open order; total is zero.
    Free,
    /// An open order exists.
    Occupied,
    /// Transient: payment recorded, next snapshot will confirm Free.
    /// Arrives only from server snapshots; local settlement forces Free.
    Settled,
}

impl Default for TableStatus {
    fn default() -> Self {
        TableStatus::Free
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debit card on an external terminal.
    Debit,
    /// Credit card on an external terminal.
    Credit,
    /// Physical cash.
    Cash,
}

impl PaymentMethod {
    /// Wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item of a comanda.
/// The subtotal is frozen server-side; the core never recomputes prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product name shown to kitchen and cashier.
    pub name: String,

    /// Units ordered (positive).
    pub quantity: i64,

    /// Unit price in minor units (non-negative).
    pub unit_price: Money,

    /// quantity × unit_price.
    pub subtotal: Money,

    /// Optional seat/customer tag ("Cliente 2").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_label: Option<String>,

    /// Free-text kitchen note. One shared note per ticket at the UI
    /// level; see `OrderQueue::edit_note`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OrderLine {
    /// Creates a line with the subtotal derived from quantity × price.
    pub fn new(name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        OrderLine {
            name: name.into(),
            quantity,
            unit_price,
            subtotal: unit_price.multiply_quantity(quantity),
            customer_label: None,
            note: None,
        }
    }
}

// =============================================================================
// Order Notice (new-order push event, validated)
// =============================================================================

/// A validated "new comanda" notification from the push channel.
///
/// Carries no preparation state or arrival time; both are assigned by
/// the receiving queue at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotice {
    /// Opaque server-assigned id, unique for the lifetime of the order.
    pub order_id: String,

    /// Table the order belongs to (1..=N).
    pub table_number: u32,

    /// Line items in kitchen order.
    pub items: Vec<OrderLine>,
}

// =============================================================================
// Order Detail (cashier working set)
// =============================================================================

/// The single order opened for payment review at the cashier.
///
/// Replaced wholesale each time a table is selected; cleared on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub order_id: String,

    pub table_number: u32,

    pub items: Vec<OrderLine>,

    /// Sum of subtotals, the basis for tip/rounding computation.
    /// Frozen server-side together with the items.
    pub raw_total: Money,

    /// When the service opened the order.
    #[ts(as = "Option<String>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Payment Request (commit payload)
// =============================================================================

/// The payload submitted to the settlement service on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: String,

    pub table_number: u32,

    /// Total before tip.
    pub raw_total: Money,

    /// The rounded tip (nearest hundred), not the exact one.
    pub tip: Money,

    /// Amount charged/tendered against: raw total + rounded tip.
    pub amount_paid: Money,

    pub method: PaymentMethod,

    /// Cash handed over; None unless method is Cash.
    pub tendered: Option<Money>,

    /// Change returned; zero unless method is Cash.
    pub change: Money,
}

// =============================================================================
// Settled Payment Record (history, read-only)
// =============================================================================

/// A settled payment as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub payment_id: String,

    pub order_id: String,

    pub table_number: u32,

    pub raw_total: Money,

    pub tip: Money,

    pub amount_paid: Money,

    pub method: PaymentMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tendered: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<Money>,

    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

/// Optional filters for the payment history query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Inclusive start date.
    pub from: Option<NaiveDate>,

    /// Inclusive end date.
    pub to: Option<NaiveDate>,

    /// Restrict to one table.
    pub table: Option<u32>,

    /// Restrict to one payment method.
    pub method: Option<PaymentMethod>,

    /// Maximum number of records to return.
    pub limit: Option<u32>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_state_toggled() {
        assert_eq!(OrderState::Preparing.toggled(), OrderState::Done);
        assert_eq!(OrderState::Done.toggled(), OrderState::Preparing);
    }

    #[test]
    fn test_order_line_subtotal() {
        let line = OrderLine::new("Lomo a lo pobre", 2, Money::from_minor(5000));
        assert_eq!(line.subtotal.minor(), 10000);
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(PaymentMethod::Debit.as_str(), "debit");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cash).unwrap(),
            "\"cash\""
        );
    }

    #[test]
    fn test_order_notice_camel_case_wire() {
        let notice = OrderNotice {
            order_id: "42".into(),
            table_number: 7,
            items: vec![OrderLine::new("Empanada", 1, Money::from_minor(3000))],
        };
        let json = serde_json::to_string(&notice).unwrap();
        assert!(json.contains("\"orderId\":\"42\""));
        assert!(json.contains("\"tableNumber\":7"));
        assert!(json.contains("\"unitPrice\":3000"));
    }
}
