//! # comanda-core: Pure Business Logic for the Comanda System
//!
//! This crate is the **heart** of the comanda system. It contains all
//! business logic as pure functions and state machines with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Comanda Architecture                           │
//! │                                                                     │
//! │  ┌───────────────────────┐      ┌───────────────────────┐          │
//! │  │   Kitchen Station     │      │   Cashier Station     │          │
//! │  │   (apps/kitchen)      │      │   (apps/cashier)      │          │
//! │  └──────────┬────────────┘      └──────────┬────────────┘          │
//! │             │                              │                        │
//! │  ┌──────────▼──────────────────────────────▼────────────┐          │
//! │  │            ★ comanda-core (THIS CRATE) ★             │          │
//! │  │                                                      │          │
//! │  │  ┌────────┐ ┌────────┐ ┌────────┐ ┌──────────────┐  │          │
//! │  │  │ money  │ │ queue  │ │ ledger │ │    tender    │  │          │
//! │  │  │ Money  │ │ Ticket │ │ Table  │ │ Breakdown    │  │          │
//! │  │  │rounding│ │ Queue  │ │ Ledger │ │ commit guard │  │          │
//! │  │  └────────┘ └────────┘ └────────┘ └──────────────┘  │          │
//! │  │                                                      │          │
//! │  │   NO I/O • NO NETWORK • NO CHANNEL • PURE LOGIC      │          │
//! │  └──────────────────────────────────────────────────────┘          │
//! │             ▲                              ▲                        │
//! │  ┌──────────┴────────────┐      ┌──────────┴────────────┐          │
//! │  │    comanda-sync       │      │    comanda-client     │          │
//! │  │  push channel bridge  │      │  settlement service   │          │
//! │  └───────────────────────┘      └───────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (OrderNotice, OrderDetail, PaymentRequest, ...)
//! - [`queue`] - Kitchen order queue state machine
//! - [`ledger`] - Cashier table ledger with full-replace reconciliation
//! - [`tender`] - Tip/rounding and payment-due calculation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every computation is deterministic
//! 2. **No I/O**: network and channel access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values in minor units (i64)
//! 4. **Status over panic**: expected conditions (duplicate ingest,
//!    absent id) are reported as booleans, never thrown
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::money::Money;
//! use comanda_core::tender::TenderBreakdown;
//! use comanda_core::types::PaymentMethod;
//!
//! let b = TenderBreakdown::compute(
//!     Money::from_minor(12345),
//!     10,
//!     PaymentMethod::Debit,
//!     None,
//! );
//!
//! assert_eq!(b.exact_tip.minor(), 1235);
//! assert_eq!(b.amount_due.minor(), 13545);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod queue;
pub mod tender;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{TableEntry, TableLedger, TableTotal};
pub use money::Money;
pub use queue::{OrderQueue, Ticket};
pub use tender::TenderBreakdown;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default table count of the cashier grid.
///
/// The grid has fixed cardinality: every station renders exactly this
/// many tables, and ids outside 1..=count are ignored on reconcile.
/// Overridable per station in its config file.
pub const DEFAULT_TABLE_COUNT: u32 = 19;

/// Tip presets offered by the cashier UI; free entry up to
/// [`MAX_TIP_PERCENT`] is also allowed.
pub const TIP_PRESETS: [u8; 3] = [0, 10, 15];

/// Upper bound for the tip percentage.
pub const MAX_TIP_PERCENT: u8 = 100;
