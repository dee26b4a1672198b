//! # Push Channel Protocol
//!
//! Message types for the publish/subscribe channel between the
//! settlement service and the stations.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Push Channel Messages                            │
//! │                                                                     │
//! │  SUBSCRIPTION (station → server)                                    │
//! │  ───────────────────────────────                                    │
//! │  STATION ───► SubscribeTables { station_id }                        │
//! │  STATION ───► UnsubscribeTables { station_id }   (on teardown)      │
//! │                                                                     │
//! │  PUSH EVENTS (server → station)                                     │
//! │  ──────────────────────────────                                     │
//! │  SERVER  ───► TableTotals { tables: [...] }   (full snapshot)       │
//! │  SERVER  ───► NewOrder { orderId, tableNumber, items }              │
//! │                                                                     │
//! │  KEEPALIVE                                                          │
//! │  ─────────                                                          │
//! │  Both    ◄──► Ping { timestamp } / Pong { ... }                     │
//! │                                                                     │
//! │  ERROR                                                              │
//! │  ─────                                                              │
//! │  Both    ◄──► Error { code, message }                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Tagged JSON using serde's adjacently tagged enum:
//! ```json
//! { "type": "NewOrder", "payload": { "orderId": "881", ... } }
//! ```
//!
//! Inbound payloads carry no schema guarantee. Every field that the
//! server might omit is an `Option`, and each payload validates into
//! its core type before touching any state; malformed events are
//! dropped, never trusted.

use serde::{Deserialize, Serialize};

use comanda_core::money::Money;
use comanda_core::types::{OrderLine, OrderNotice, TableStatus};
use comanda_core::TableTotal;

/// Current protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

// =============================================================================
// Main Message Enum (Tagged Union)
// =============================================================================

/// All push channel messages.
///
/// Uses serde's adjacently tagged enum for clean JSON serialization:
/// `{ "type": "TableTotals", "payload": { ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PushMessage {
    // =========================================================================
    // Subscription Intents (station → server)
    // =========================================================================
    /// Ask the server to start pushing table-totals snapshots.
    SubscribeTables(SubscribePayload),

    /// Stop pushing snapshots; sent on view teardown.
    UnsubscribeTables(SubscribePayload),

    // =========================================================================
    // Push Events (server → station)
    // =========================================================================
    /// Full snapshot of all tables' current totals and status.
    TableTotals(TableTotalsPayload),

    /// A comanda was opened; full order payload.
    NewOrder(NewOrderPayload),

    // =========================================================================
    // Keepalive Messages
    // =========================================================================
    /// Ping for keepalive.
    Ping { timestamp: String },

    /// Pong response for keepalive.
    Pong {
        ping_timestamp: String,
        pong_timestamp: String,
    },

    // =========================================================================
    // Error Messages
    // =========================================================================
    /// Error message.
    Error { code: String, message: String },
}

// =============================================================================
// Subscription Payload
// =============================================================================

/// Identity attached to subscribe/unsubscribe intents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribePayload {
    /// Station identifier (locally generated, stable across restarts).
    pub station_id: String,

    /// Human-readable station name.
    pub station_name: String,

    /// Protocol version supported by this station.
    pub protocol_version: u32,
}

impl SubscribePayload {
    pub fn new(station_id: &str, station_name: &str) -> Self {
        SubscribePayload {
            station_id: station_id.to_string(),
            station_name: station_name.to_string(),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

// =============================================================================
// Table Totals Payload
// =============================================================================

/// A pushed snapshot of aggregate per-table totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableTotalsPayload {
    pub tables: Vec<TableTotalWire>,
}

/// One snapshot entry as it arrives on the wire, shape unverified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableTotalWire {
    pub table_id: Option<u32>,

    pub total: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
}

impl TableTotalWire {
    /// Validates the entry into its core type.
    ///
    /// `table_id` and `total` are required; an entry missing either is
    /// malformed and yields None (the caller drops it). Status stays
    /// optional; the ledger defaults it from the total.
    pub fn validate(self) -> Option<TableTotal> {
        Some(TableTotal {
            table_id: self.table_id?,
            total: self.total?,
            status: self.status,
        })
    }
}

// =============================================================================
// New Order Payload
// =============================================================================

/// A pushed "new comanda" event, shape unverified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderPayload {
    pub order_id: Option<String>,

    pub table_number: Option<u32>,

    #[serde(default)]
    pub items: Vec<OrderLineWire>,
}

/// One line item as it arrives on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineWire {
    pub name: Option<String>,

    pub quantity: Option<i64>,

    pub unit_price: Option<Money>,

    /// Omitted by some producers; derived from quantity × unit price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OrderLineWire {
    /// Validates one line: name, a positive quantity and a non-negative
    /// unit price are required. Malformed lines are dropped
    /// individually without discarding the event.
    fn validate(self) -> Option<OrderLine> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        let quantity = self.quantity.filter(|q| *q > 0)?;
        let unit_price = self.unit_price.filter(|p| !p.is_negative())?;

        Some(OrderLine {
            subtotal: self
                .subtotal
                .unwrap_or_else(|| unit_price.multiply_quantity(quantity)),
            name,
            quantity,
            unit_price,
            customer_label: self.customer_label,
            note: self.note,
        })
    }
}

impl NewOrderPayload {
    /// Validates the event into an [`OrderNotice`].
    ///
    /// A missing or empty order id, or a missing table number, makes
    /// the whole event malformed (None); it must be dropped without
    /// mutating state.
    pub fn validate(self) -> Option<OrderNotice> {
        let order_id = self.order_id.filter(|id| !id.trim().is_empty())?;
        let table_number = self.table_number.filter(|t| *t >= 1)?;

        Some(OrderNotice {
            order_id,
            table_number,
            items: self
                .items
                .into_iter()
                .filter_map(OrderLineWire::validate)
                .collect(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

impl PushMessage {
    /// Returns the message type name as a string (for logging).
    pub fn type_name(&self) -> &'static str {
        match self {
            PushMessage::SubscribeTables(_) => "SubscribeTables",
            PushMessage::UnsubscribeTables(_) => "UnsubscribeTables",
            PushMessage::TableTotals(_) => "TableTotals",
            PushMessage::NewOrder(_) => "NewOrder",
            PushMessage::Ping { .. } => "Ping",
            PushMessage::Pong { .. } => "Pong",
            PushMessage::Error { .. } => "Error",
        }
    }

    /// Creates a SubscribeTables intent.
    pub fn subscribe(station: &SubscribePayload) -> Self {
        PushMessage::SubscribeTables(station.clone())
    }

    /// Creates an UnsubscribeTables intent.
    pub fn unsubscribe(station: &SubscribePayload) -> Self {
        PushMessage::UnsubscribeTables(station.clone())
    }

    /// Creates a Ping message.
    pub fn ping() -> Self {
        PushMessage::Ping {
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates a Pong message.
    pub fn pong(ping_timestamp: &str) -> Self {
        PushMessage::Pong {
            ping_timestamp: ping_timestamp.to_string(),
            pong_timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Serializes to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_roundtrip() {
        let station = SubscribePayload::new("stn-1", "Caja 1");
        let msg = PushMessage::subscribe(&station);
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"SubscribeTables\""));
        assert!(json.contains("\"stationId\":\"stn-1\""));

        let parsed = PushMessage::from_json(&json).unwrap();
        match parsed {
            PushMessage::SubscribeTables(p) => {
                assert_eq!(p.station_id, "stn-1");
                assert_eq!(p.protocol_version, PROTOCOL_VERSION);
            }
            other => panic!("expected SubscribeTables, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_table_totals_parsing() {
        let json = r#"{
            "type": "TableTotals",
            "payload": { "tables": [
                { "tableId": 3, "total": 12500 },
                { "tableId": 7, "total": 8000, "status": "settled" },
                { "total": 999 }
            ]}
        }"#;

        let msg = PushMessage::from_json(json).unwrap();
        let PushMessage::TableTotals(payload) = msg else {
            panic!("expected TableTotals");
        };

        let totals: Vec<_> = payload
            .tables
            .into_iter()
            .filter_map(TableTotalWire::validate)
            .collect();

        // The entry without a tableId is malformed and dropped
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].table_id, 3);
        assert_eq!(totals[0].total.minor(), 12500);
        assert_eq!(totals[1].status, Some(TableStatus::Settled));
    }

    #[test]
    fn test_new_order_validation() {
        let json = r#"{
            "type": "NewOrder",
            "payload": {
                "orderId": "881",
                "tableNumber": 7,
                "items": [
                    { "name": "Churrasco", "quantity": 1, "unitPrice": 5000 },
                    { "name": "Café", "quantity": 2, "unitPrice": 1500, "subtotal": 3000 },
                    { "quantity": 1, "unitPrice": 100 }
                ]
            }
        }"#;

        let PushMessage::NewOrder(payload) = PushMessage::from_json(json).unwrap() else {
            panic!("expected NewOrder");
        };

        let notice = payload.validate().unwrap();
        assert_eq!(notice.order_id, "881");
        assert_eq!(notice.table_number, 7);
        // Nameless line dropped, subtotal derived when omitted
        assert_eq!(notice.items.len(), 2);
        assert_eq!(notice.items[0].subtotal.minor(), 5000);
        assert_eq!(notice.items[1].subtotal.minor(), 3000);
    }

    #[test]
    fn test_new_order_without_id_is_malformed() {
        let payload = NewOrderPayload {
            order_id: None,
            table_number: Some(4),
            items: vec![],
        };
        assert!(payload.validate().is_none());

        let payload = NewOrderPayload {
            order_id: Some("  ".into()),
            table_number: Some(4),
            items: vec![],
        };
        assert!(payload.validate().is_none());

        let payload = NewOrderPayload {
            order_id: Some("77".into()),
            table_number: None,
            items: vec![],
        };
        assert!(payload.validate().is_none());
    }

    #[test]
    fn test_line_rejects_nonpositive_quantity() {
        let line = OrderLineWire {
            name: Some("Té".into()),
            quantity: Some(0),
            unit_price: Some(Money::from_minor(1000)),
            subtotal: None,
            customer_label: None,
            note: None,
        };
        assert!(line.validate().is_none());
    }

    #[test]
    fn test_error_message_roundtrip() {
        let msg = PushMessage::Error {
            code: "SUBSCRIBE_FAILED".into(),
            message: "channel at capacity".into(),
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains("SUBSCRIBE_FAILED"));
        assert!(matches!(
            PushMessage::from_json(&json).unwrap(),
            PushMessage::Error { .. }
        ));
    }
}
