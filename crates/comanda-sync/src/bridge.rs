//! # Event Subscription Bridge
//!
//! Owns the push channel lifecycle for one mounted view and routes
//! inbound events into that view's core state.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Bridge Lifecycle                               │
//! │                                                                     │
//! │  view entry ──► EventBridge::open(config, station, sink)            │
//! │                     │                                               │
//! │                     ├── spawns Transport (auto-reconnect)           │
//! │                     └── spawns routing task                         │
//! │                                                                     │
//! │  per connection:   Connected ──► send SubscribeTables (once)        │
//! │                    (reconnect ──► subscribe again; the server       │
//! │                     forgets subscriptions across connections)       │
//! │                                                                     │
//! │  inbound:          TableTotals ──► EventSink::on_table_totals       │
//! │                    NewOrder    ──► EventSink::on_new_order          │
//! │                    malformed   ──► dropped with a warning           │
//! │                                                                     │
//! │  view exit ──► bridge.close()                                       │
//! │                     ├── send UnsubscribeTables (best effort)        │
//! │                     └── transport shutdown + task join              │
//! │                                                                     │
//! │  any other exit (drop without close, task death): an RAII guard     │
//! │  fires the unsubscribe + shutdown on the synchronous path.          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One bridge instance per view, constructed on view entry, never a
//! process-wide singleton. The kitchen and cashier views each own
//! their bridge exclusively.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use comanda_core::types::OrderNotice;
use comanda_core::TableTotal;

use crate::protocol::{PushMessage, SubscribePayload, TableTotalWire};
use crate::transport::{ConnectionState, Transport, TransportConfig, TransportEvent, TransportHandle};

// =============================================================================
// Event Sink
// =============================================================================

/// Where validated inbound events land.
///
/// Each view implements only the methods it consumes: the kitchen sink
/// ingests new orders, the cashier sink reconciles table totals. The
/// defaults are no-ops.
pub trait EventSink: Send + 'static {
    /// A validated table-totals snapshot arrived.
    fn on_table_totals(&mut self, _totals: Vec<TableTotal>) {}

    /// A validated new-order notification arrived.
    fn on_new_order(&mut self, _notice: OrderNotice) {}

    /// The channel connection state changed (display only).
    fn on_connection(&mut self, _connected: bool) {}
}

// =============================================================================
// Unsubscribe Guard
// =============================================================================

/// Fires a best-effort unsubscribe + transport shutdown when dropped.
///
/// Covers every exit path that skips [`EventBridge::close`]; failures
/// are ignored (the transport may already be gone).
struct UnsubscribeGuard {
    transport: TransportHandle,
    station: SubscribePayload,
    armed: bool,
}

impl UnsubscribeGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("bridge dropped without close; releasing subscription");
        let _ = self
            .transport
            .try_send(PushMessage::unsubscribe(&self.station));
        let _ = self.transport.try_shutdown();
    }
}

// =============================================================================
// Event Bridge
// =============================================================================

/// The per-view handle to the push channel.
pub struct EventBridge {
    transport: TransportHandle,
    station: SubscribePayload,
    guard: Option<UnsubscribeGuard>,
    task: JoinHandle<()>,
}

impl EventBridge {
    /// Opens the channel for one view: spawns the transport and the
    /// routing task.
    ///
    /// The subscribe intent is issued once per established connection,
    /// including after each reconnect.
    pub fn open<S: EventSink>(
        config: TransportConfig,
        station: SubscribePayload,
        sink: S,
    ) -> EventBridge {
        let (transport, events) = Transport::spawn(config);

        let task = tokio::spawn(Self::route_events(
            transport.clone(),
            station.clone(),
            events,
            sink,
        ));

        let guard = UnsubscribeGuard {
            transport: transport.clone(),
            station: station.clone(),
            armed: true,
        };

        EventBridge {
            transport,
            station,
            guard: Some(guard),
            task,
        }
    }

    /// Routing loop: subscription per connection, validation, dispatch.
    async fn route_events<S: EventSink>(
        transport: TransportHandle,
        station: SubscribePayload,
        mut events: tokio::sync::mpsc::Receiver<TransportEvent>,
        mut sink: S,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Connected => {
                    info!("channel connected; subscribing to table totals");
                    if let Err(e) = transport.send(PushMessage::subscribe(&station)).await {
                        warn!(error = %e, "failed to queue subscribe intent");
                    }
                    sink.on_connection(true);
                }
                TransportEvent::Disconnected => {
                    warn!("channel disconnected; reconnect in progress");
                    sink.on_connection(false);
                }
                TransportEvent::Message(msg) => Self::route_message(msg, &mut sink),
            }
        }
        debug!("transport event stream ended");
    }

    /// Dispatches one inbound message after validation.
    ///
    /// Malformed payloads are dropped without mutating state; they must
    /// never crash the view.
    fn route_message<S: EventSink>(msg: PushMessage, sink: &mut S) {
        match msg {
            PushMessage::TableTotals(payload) => {
                let raw_len = payload.tables.len();
                let totals: Vec<TableTotal> = payload
                    .tables
                    .into_iter()
                    .filter_map(|entry| match TableTotalWire::validate(entry) {
                        Some(total) => Some(total),
                        None => {
                            warn!("dropping malformed snapshot entry");
                            None
                        }
                    })
                    .collect();
                debug!(tables = totals.len(), raw = raw_len, "routing totals snapshot");
                sink.on_table_totals(totals);
            }
            PushMessage::NewOrder(payload) => match payload.validate() {
                Some(notice) => {
                    debug!(order_id = %notice.order_id, table = notice.table_number, "routing new order");
                    sink.on_new_order(notice);
                }
                None => warn!("dropping malformed new-order event"),
            },
            PushMessage::Error { code, message } => {
                warn!(%code, %message, "channel error event");
            }
            other => {
                debug!(msg_type = %other.type_name(), "ignoring message");
            }
        }
    }

    /// Current transport state (display only).
    pub async fn connection_state(&self) -> ConnectionState {
        self.transport.state().await
    }

    /// Returns true while the channel is connected.
    pub async fn is_connected(&self) -> bool {
        self.transport.is_connected().await
    }

    /// Tears the view's subscription down: unsubscribe, then close the
    /// transport and join the routing task.
    ///
    /// The unsubscribe is best effort; a failure is logged and the
    /// teardown continues.
    pub async fn close(mut self) {
        if let Some(guard) = self.guard.take() {
            guard.disarm();
        }

        if let Err(e) = self
            .transport
            .send(PushMessage::unsubscribe(&self.station))
            .await
        {
            debug!(error = %e, "unsubscribe on teardown failed; ignoring");
        }
        if let Err(e) = self.transport.shutdown().await {
            debug!(error = %e, "transport already stopped");
        }

        if self.task.await.is_err() {
            warn!("routing task ended abnormally");
        }
        info!("bridge closed");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_core::money::Money;
    use comanda_core::types::TableStatus;
    use std::sync::{Arc, Mutex};

    use crate::protocol::{NewOrderPayload, OrderLineWire, TableTotalsPayload};

    /// Records everything routed to it.
    #[derive(Default)]
    struct RecordingSink {
        totals: Arc<Mutex<Vec<Vec<TableTotal>>>>,
        orders: Arc<Mutex<Vec<OrderNotice>>>,
    }

    impl EventSink for RecordingSink {
        fn on_table_totals(&mut self, totals: Vec<TableTotal>) {
            self.totals.lock().unwrap().push(totals);
        }

        fn on_new_order(&mut self, notice: OrderNotice) {
            self.orders.lock().unwrap().push(notice);
        }
    }

    fn totals_message() -> PushMessage {
        PushMessage::TableTotals(TableTotalsPayload {
            tables: vec![
                TableTotalWire {
                    table_id: Some(3),
                    total: Some(Money::from_minor(12500)),
                    status: None,
                },
                TableTotalWire {
                    table_id: None, // malformed, must be dropped
                    total: Some(Money::from_minor(999)),
                    status: Some(TableStatus::Occupied),
                },
            ],
        })
    }

    #[test]
    fn test_route_totals_drops_malformed_entries() {
        let mut sink = RecordingSink::default();
        let seen = sink.totals.clone();

        EventBridge::route_message(totals_message(), &mut sink);

        let snapshots = seen.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].len(), 1);
        assert_eq!(snapshots[0][0].table_id, 3);
    }

    #[test]
    fn test_route_new_order_and_malformed_event() {
        let mut sink = RecordingSink::default();
        let seen = sink.orders.clone();

        EventBridge::route_message(
            PushMessage::NewOrder(NewOrderPayload {
                order_id: Some("42".into()),
                table_number: Some(7),
                items: vec![OrderLineWire {
                    name: Some("Cazuela".into()),
                    quantity: Some(1),
                    unit_price: Some(Money::from_minor(6500)),
                    subtotal: None,
                    customer_label: None,
                    note: None,
                }],
            }),
            &mut sink,
        );

        // Missing order id: dropped, sink untouched
        EventBridge::route_message(
            PushMessage::NewOrder(NewOrderPayload {
                order_id: None,
                table_number: Some(7),
                items: vec![],
            }),
            &mut sink,
        );

        let orders = seen.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "42");
    }

    #[test]
    fn test_route_ignores_unrelated_messages() {
        let mut sink = RecordingSink::default();
        let totals = sink.totals.clone();
        let orders = sink.orders.clone();

        EventBridge::route_message(PushMessage::ping(), &mut sink);
        EventBridge::route_message(
            PushMessage::Error {
                code: "X".into(),
                message: "boom".into(),
            },
            &mut sink,
        );

        assert!(totals.lock().unwrap().is_empty());
        assert!(orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_is_clean_with_dead_transport() {
        // Transport that can never connect and gives up immediately
        let config = TransportConfig {
            url: "ws://127.0.0.1:1/unreachable".into(),
            connect_timeout: std::time::Duration::from_millis(50),
            max_retries: 1,
            ..Default::default()
        };
        let bridge = EventBridge::open(
            config,
            SubscribePayload::new("stn-test", "Test"),
            RecordingSink::default(),
        );

        // Teardown must not hang or panic even though the transport
        // is already gone
        bridge.close().await;
    }
}
