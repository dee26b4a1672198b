//! # comanda-client: Settlement Service Client
//!
//! Request/response calls to the external settlement/catalog service.
//! Three calls exist, all consumed by the cashier station:
//!
//! - fetch the order open at a table (or an explicit "no open order")
//! - submit a payment commit
//! - fetch settled-payment history with optional filters
//!
//! The [`SettlementApi`] trait is the seam the payment commit flow is
//! written against; [`SettlementClient`] is the HTTP implementation and
//! tests substitute scripted ones. Nothing in this crate retries:
//! failures surface as one displayable message and retry is a user
//! re-action.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod http;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ClientError, ClientResult};
pub use http::{ClientConfig, SettlementClient};

use comanda_core::types::{HistoryFilter, OrderDetail, PaymentRecord, PaymentRequest};

// =============================================================================
// Settlement API Seam
// =============================================================================

/// The settlement service contract as the cashier flow sees it.
pub trait SettlementApi {
    /// Fetches the order currently open at `table`; None means the
    /// explicit "no open order" result.
    fn order_for_table(
        &self,
        table: u32,
    ) -> impl std::future::Future<Output = ClientResult<Option<OrderDetail>>> + Send;

    /// Submits a payment commit; Ok is the service acknowledgement.
    fn submit_payment(
        &self,
        request: &PaymentRequest,
    ) -> impl std::future::Future<Output = ClientResult<()>> + Send;

    /// Fetches settled payments, newest first, honoring the filters.
    fn payment_history(
        &self,
        filter: &HistoryFilter,
    ) -> impl std::future::Future<Output = ClientResult<Vec<PaymentRecord>>> + Send;
}
