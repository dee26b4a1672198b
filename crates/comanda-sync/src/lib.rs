//! # comanda-sync: Push Channel Bridge
//!
//! This crate provides the publish/subscribe side of a station: a
//! WebSocket transport with automatic reconnection, the tagged wire
//! protocol, and an [`EventBridge`] that owns the subscription
//! lifecycle for one mounted view.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Bridge Architecture                             │
//! │                                                                     │
//! │  ┌──────────────────────────────────────────────────────────────┐   │
//! │  │                EventBridge (per view, owned)                 │   │
//! │  │                                                              │   │
//! │  │  • subscribes on every established connection                │   │
//! │  │  • validates inbound payloads, drops malformed ones          │   │
//! │  │  • routes to the view's EventSink                            │   │
//! │  │  • guarantees unsubscribe on teardown (RAII guard)           │   │
//! │  └────────────────────────────┬─────────────────────────────────┘   │
//! │                               │                                     │
//! │         ┌─────────────────────┴──────────────────┐                  │
//! │         ▼                                        ▼                  │
//! │  ┌────────────────┐                     ┌────────────────┐          │
//! │  │   Transport    │                     │   Protocol     │          │
//! │  │  (WebSocket)   │                     │ (tagged JSON)  │          │
//! │  │                │                     │                │          │
//! │  │ auto-reconnect │                     │ lenient wire   │          │
//! │  │ with backoff   │                     │ types, strict  │          │
//! │  │                │                     │ validation     │          │
//! │  └────────────────┘                     └────────────────┘          │
//! │                                                                     │
//! │  Missed events are never buffered: the next totals snapshot         │
//! │  fully replaces ledger state, which is why reconciliation is        │
//! │  full-replace and tolerates gaps.                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`bridge`] - Per-view [`EventBridge`] and the [`EventSink`] seam
//! - [`config`] - Station configuration (TOML, platform config dir)
//! - [`error`] - Channel error types
//! - [`protocol`] - Message types for the push channel
//! - [`transport`] - WebSocket client with reconnection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_sync::{EventBridge, EventSink, StationConfig, SubscribePayload};
//!
//! let config = StationConfig::load_or_default(None, "Caja 1")?;
//! let station = SubscribePayload::new(&config.station.id, &config.station.name);
//!
//! let bridge = EventBridge::open(config.transport_config(), station, sink);
//! // ... view runs ...
//! bridge.close().await; // unsubscribe + teardown
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bridge;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use bridge::{EventBridge, EventSink};
pub use config::StationConfig;
pub use error::{SyncError, SyncResult};
pub use protocol::{PushMessage, SubscribePayload};
pub use transport::{ConnectionState, TransportConfig};
