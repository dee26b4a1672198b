//! # Checkout Session
//!
//! The payment commit flow for one table-selection session.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  Checkout Session Phases                            │
//! │                                                                     │
//! │             begin_select(table)                                     │
//! │  ┌──────┐ ────────────────────► ┌─────────┐                         │
//! │  │ Idle │                       │ Loading │                         │
//! │  └──────┘ ◄──────────────────── └────┬────┘                         │
//! │      ▲      fetch error /            │ detail applied               │
//! │      │      no open order            ▼                              │
//! │      │                          ┌─────────┐  set tip/method/cash    │
//! │      │                          │ Loaded  │ ◄────────────────────   │
//! │      │                          └────┬────┘ ◄──┐                    │
//! │      │                               │ confirm │ submit error       │
//! │      │                               ▼         │ (inputs intact)    │
//! │      │        commit ok         ┌──────────┐   │                    │
//! │      └───────────────────────── │Submitting│ ──┘                    │
//! │         + mark_settled          └──────────┘                        │
//! │                                                                     │
//! │  LAST SELECTION WINS                                                │
//! │  ───────────────────                                                │
//! │  begin_select hands out a token; apply_detail discards any          │
//! │  response whose token is no longer current. An in-flight fetch      │
//! │  for a previously selected table can never clobber the newer        │
//! │  selection.                                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation failures (cash shortfall, missing tender) block the
//! commit synchronously; no network call is issued for them.

use tracing::{debug, info, warn};

use comanda_client::{ClientResult, SettlementApi};
use comanda_core::tender::TenderBreakdown;
use comanda_core::types::{OrderDetail, PaymentMethod, PaymentRequest};
use comanda_core::validation::{validate_amount, validate_tip_percent};
use comanda_core::{CoreError, Money};

use crate::state::LedgerState;

// =============================================================================
// Session Phase
// =============================================================================

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No table selected.
    Idle,
    /// A detail fetch is in flight for the chosen table.
    Loading,
    /// Order detail available; intent editable.
    Loaded,
    /// A commit request is in flight.
    Submitting,
}

/// Token identifying one selection; stale fetch responses carry an old
/// token and are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionToken(u64);

// =============================================================================
// Checkout Session
// =============================================================================

/// The cashier's working state for one table selection.
///
/// Derived figures are never stored: [`CheckoutSession::breakdown`]
/// recomputes on every call, so tip/method/tender edits are always
/// reflected.
pub struct CheckoutSession {
    phase: SessionPhase,
    selection_seq: u64,
    table: Option<u32>,
    detail: Option<OrderDetail>,

    // Payment intent, reset on every fresh load
    tip_percent: u8,
    method: PaymentMethod,
    cash_tendered: Option<Money>,

    // Surfaced to the view
    error: Option<String>,
    notice: Option<String>,
}

impl CheckoutSession {
    pub fn new() -> Self {
        CheckoutSession {
            phase: SessionPhase::Idle,
            selection_seq: 0,
            table: None,
            detail: None,
            tip_percent: 0,
            method: PaymentMethod::Debit,
            cash_tendered: None,
            error: None,
            notice: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn table(&self) -> Option<u32> {
        self.table
    }

    pub fn detail(&self) -> Option<&OrderDetail> {
        self.detail.as_ref()
    }

    pub fn tip_percent(&self) -> u8 {
        self.tip_percent
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn cash_tendered(&self) -> Option<Money> {
        self.cash_tendered
    }

    /// Last error message, for direct display.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Last success/notice message, for direct display.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// All derived figures for the current intent, recomputed now.
    pub fn breakdown(&self) -> Option<TenderBreakdown> {
        self.detail.as_ref().map(|d| {
            TenderBreakdown::compute(d.raw_total, self.tip_percent, self.method, self.cash_tendered)
        })
    }

    // =========================================================================
    // Selection (two-phase, last wins)
    // =========================================================================

    /// Starts a selection: enters Loading and invalidates any earlier
    /// in-flight fetch.
    pub fn begin_select(&mut self, table: u32) -> SelectionToken {
        self.selection_seq += 1;
        self.phase = SessionPhase::Loading;
        self.table = Some(table);
        self.detail = None;
        self.error = None;
        self.notice = None;
        debug!(table, seq = self.selection_seq, "selection started");
        SelectionToken(self.selection_seq)
    }

    /// Applies a fetch response for the selection identified by
    /// `token`.
    ///
    /// Returns false when the response is stale (a newer selection was
    /// made since); stale responses are discarded without touching any
    /// state.
    pub fn apply_detail(
        &mut self,
        token: SelectionToken,
        result: ClientResult<Option<OrderDetail>>,
    ) -> bool {
        if token.0 != self.selection_seq {
            debug!(stale = token.0, current = self.selection_seq, "discarding stale fetch response");
            return false;
        }

        match result {
            Ok(Some(detail)) => {
                info!(order_id = %detail.order_id, table = detail.table_number, "order loaded");
                self.detail = Some(detail);
                self.phase = SessionPhase::Loaded;
                self.reset_intent();
            }
            Ok(None) => {
                let table = self.table.unwrap_or_default();
                self.notice = Some(format!("Table {table} has no open order."));
                self.detail = None;
                self.phase = SessionPhase::Idle;
            }
            Err(e) => {
                warn!(error = %e, "order detail fetch failed");
                self.error = Some(e.to_string());
                self.detail = None;
                self.phase = SessionPhase::Idle;
            }
        }
        true
    }

    /// Selects a table: fetches its open order and applies the result,
    /// last selection wins.
    pub async fn select_table(&mut self, client: &impl SettlementApi, table: u32) {
        let token = self.begin_select(table);
        let result = client.order_for_table(table).await;
        self.apply_detail(token, result);
    }

    // =========================================================================
    // Payment Intent
    // =========================================================================

    /// Every fresh load starts from the defaults.
    fn reset_intent(&mut self) {
        self.tip_percent = 0;
        self.method = PaymentMethod::Debit;
        self.cash_tendered = None;
    }

    /// Sets the tip percentage (preset or free entry, 0..=100).
    pub fn set_tip_percent(&mut self, pct: u8) -> bool {
        if let Err(e) = validate_tip_percent(pct) {
            self.error = Some(e.to_string());
            return false;
        }
        self.tip_percent = pct;
        self.error = None;
        true
    }

    /// Sets the payment method. Entered cash is kept; it only matters
    /// while the method is Cash.
    pub fn set_method(&mut self, method: PaymentMethod) {
        self.method = method;
    }

    /// Sets the tendered cash amount.
    pub fn set_cash_tendered(&mut self, amount: Money) -> bool {
        if let Err(e) = validate_amount("cash tendered", amount) {
            self.error = Some(e.to_string());
            return false;
        }
        self.cash_tendered = Some(amount);
        self.error = None;
        true
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Confirms the payment.
    ///
    /// ## Behavior
    /// - Local guard first: cash shortfall or missing tender blocks the
    ///   commit and NO network call is issued
    /// - On success: optimistic `mark_settled` on the ledger, detail
    ///   cleared, intent reset, success notice set, back to Idle
    /// - On failure: the service's message is surfaced and the session
    ///   stays Loaded with every entered value intact (retry is a user
    ///   re-action)
    ///
    /// Returns true when the payment was recorded.
    pub async fn confirm(
        &mut self,
        client: &impl SettlementApi,
        ledger: &LedgerState,
    ) -> bool {
        if self.phase != SessionPhase::Loaded {
            debug!(phase = ?self.phase, "confirm ignored outside Loaded");
            return false;
        }
        let (order_id, table_number, raw_total) = match self.detail.as_ref() {
            Some(d) => (d.order_id.clone(), d.table_number, d.raw_total),
            None => {
                self.error = Some(CoreError::NoOrderLoaded.to_string());
                return false;
            }
        };

        let breakdown =
            TenderBreakdown::compute(raw_total, self.tip_percent, self.method, self.cash_tendered);

        // Synchronous guard; nothing reaches the network when it fails
        if let Err(e) = breakdown.validate_for_commit(self.method, self.cash_tendered) {
            self.error = Some(e.to_string());
            return false;
        }

        let request = PaymentRequest {
            order_id,
            table_number,
            raw_total: breakdown.raw_total,
            tip: breakdown.rounded_tip,
            amount_paid: breakdown.amount_due,
            method: self.method,
            tendered: match self.method {
                PaymentMethod::Cash => self.cash_tendered,
                _ => None,
            },
            change: breakdown.change,
        };

        self.phase = SessionPhase::Submitting;
        self.error = None;
        self.notice = None;

        match client.submit_payment(&request).await {
            Ok(()) => {
                // Optimistic local settle; the next snapshot confirms it
                ledger.with_ledger_mut(|l| l.mark_settled(request.table_number));
                info!(
                    order_id = %request.order_id,
                    table = request.table_number,
                    amount = %request.amount_paid,
                    "payment recorded"
                );
                self.notice = Some(format!(
                    "Payment recorded; table {} freed.",
                    request.table_number
                ));
                self.detail = None;
                self.table = None;
                self.reset_intent();
                self.phase = SessionPhase::Idle;
                true
            }
            Err(e) => {
                warn!(error = %e, "payment commit failed");
                self.error = Some(e.to_string());
                // Entered values stay intact for the retry
                self.phase = SessionPhase::Loaded;
                false
            }
        }
    }
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use comanda_client::ClientError;
    use comanda_core::types::{HistoryFilter, OrderLine, PaymentRecord};

    // =========================================================================
    // Scripted settlement service
    // =========================================================================

    #[derive(Default)]
    struct ScriptedService {
        details: Mutex<VecDeque<ClientResult<Option<OrderDetail>>>>,
        commits: Mutex<VecDeque<ClientResult<()>>>,
        submitted: Mutex<Vec<PaymentRequest>>,
    }

    impl ScriptedService {
        fn next_detail(&self) -> ClientResult<Option<OrderDetail>> {
            self.details
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
        }

        fn submitted_count(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }
    }

    impl SettlementApi for ScriptedService {
        async fn order_for_table(&self, _table: u32) -> ClientResult<Option<OrderDetail>> {
            self.next_detail()
        }

        async fn submit_payment(&self, request: &PaymentRequest) -> ClientResult<()> {
            self.submitted.lock().unwrap().push(request.clone());
            self.commits.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn payment_history(
            &self,
            _filter: &HistoryFilter,
        ) -> ClientResult<Vec<PaymentRecord>> {
            Ok(Vec::new())
        }
    }

    fn detail(order_id: &str, table: u32, raw_total: i64) -> OrderDetail {
        OrderDetail {
            order_id: order_id.to_string(),
            table_number: table,
            items: vec![
                OrderLine::new("Churrasco", 1, Money::from_minor(5000)),
                OrderLine::new("Jugo natural", 1, Money::from_minor(3000)),
            ],
            raw_total: Money::from_minor(raw_total),
            created_at: None,
        }
    }

    fn service_with_detail(d: OrderDetail) -> ScriptedService {
        let service = ScriptedService::default();
        service.details.lock().unwrap().push_back(Ok(Some(d)));
        service
    }

    // =========================================================================
    // Selection
    // =========================================================================

    #[tokio::test]
    async fn test_select_table_loads_and_resets_intent() {
        let service = service_with_detail(detail("42", 7, 8000));
        let mut session = CheckoutSession::new();

        // Dirty the intent to prove the fresh load resets it
        session.tip_percent = 15;
        session.method = PaymentMethod::Cash;
        session.cash_tendered = Some(Money::from_minor(100));

        session.select_table(&service, 7).await;

        assert_eq!(session.phase(), SessionPhase::Loaded);
        assert_eq!(session.detail().unwrap().raw_total.minor(), 8000);
        assert_eq!(session.tip_percent(), 0);
        assert_eq!(session.method(), PaymentMethod::Debit);
        assert_eq!(session.cash_tendered(), None);
    }

    #[tokio::test]
    async fn test_select_table_without_open_order() {
        let service = ScriptedService::default(); // answers Ok(None)
        let mut session = CheckoutSession::new();

        session.select_table(&service, 4).await;

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.detail().is_none());
        assert_eq!(session.notice(), Some("Table 4 has no open order."));
    }

    #[tokio::test]
    async fn test_select_table_fetch_error() {
        let service = ScriptedService::default();
        service
            .details
            .lock()
            .unwrap()
            .push_back(Err(ClientError::Api {
                status: 500,
                message: "database unavailable".into(),
            }));
        let mut session = CheckoutSession::new();

        session.select_table(&service, 4).await;

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.error(), Some("database unavailable"));
    }

    #[test]
    fn test_last_selection_wins() {
        let mut session = CheckoutSession::new();

        // Fetch A is in flight when the cashier clicks table 9
        let token_a = session.begin_select(7);
        let token_b = session.begin_select(9);

        // A's late response is discarded without touching state
        assert!(!session.apply_detail(token_a, Ok(Some(detail("a", 7, 1000)))));
        assert_eq!(session.phase(), SessionPhase::Loading);
        assert!(session.detail().is_none());

        // B's response lands
        assert!(session.apply_detail(token_b, Ok(Some(detail("b", 9, 2000)))));
        assert_eq!(session.phase(), SessionPhase::Loaded);
        assert_eq!(session.detail().unwrap().order_id, "b");
        assert_eq!(session.table(), Some(9));
    }

    // =========================================================================
    // Intent & breakdown
    // =========================================================================

    #[tokio::test]
    async fn test_breakdown_recomputes_on_edits() {
        let service = service_with_detail(detail("42", 7, 12345));
        let mut session = CheckoutSession::new();
        session.select_table(&service, 7).await;

        assert_eq!(session.breakdown().unwrap().amount_due.minor(), 12345);

        assert!(session.set_tip_percent(10));
        let b = session.breakdown().unwrap();
        assert_eq!(b.exact_tip.minor(), 1235);
        assert_eq!(b.rounded_tip.minor(), 1200);
        assert_eq!(b.amount_due.minor(), 13545);
        assert_eq!(b.final_rounded_total.minor(), 13600);

        assert!(!session.set_tip_percent(200));
        assert_eq!(session.tip_percent(), 10); // unchanged
        assert!(session.error().is_some());
    }

    // =========================================================================
    // Commit
    // =========================================================================

    #[tokio::test]
    async fn test_commit_happy_path_settles_table() {
        let service = service_with_detail(detail("42", 7, 8000));
        let ledger = LedgerState::new(19);
        ledger.with_ledger_mut(|l| {
            l.reconcile(&[comanda_core::TableTotal {
                table_id: 7,
                total: Money::from_minor(8000),
                status: None,
            }])
        });

        let mut session = CheckoutSession::new();
        session.select_table(&service, 7).await;
        session.set_tip_percent(15);

        assert!(session.confirm(&service, &ledger).await);

        // Payload carries the rounded tip and the amount due
        let submitted = service.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].order_id, "42");
        assert_eq!(submitted[0].tip.minor(), 1200);
        assert_eq!(submitted[0].amount_paid.minor(), 9200);
        assert_eq!(submitted[0].tendered, None);
        assert!(submitted[0].change.is_zero());
        drop(submitted);

        // Optimistic settle applied, session back to Idle
        let entry = ledger.with_ledger(|l| *l.get(7).unwrap());
        assert!(entry.total.is_zero());
        assert_eq!(entry.status, comanda_core::types::TableStatus::Free);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.detail().is_none());
        assert!(session.notice().unwrap().contains("table 7"));
    }

    #[tokio::test]
    async fn test_commit_cash_shortfall_blocked_without_network() {
        let service = service_with_detail(detail("42", 7, 10000));
        let ledger = LedgerState::new(19);
        let mut session = CheckoutSession::new();
        session.select_table(&service, 7).await;

        session.set_method(PaymentMethod::Cash);
        session.set_cash_tendered(Money::from_minor(9000));

        assert!(!session.confirm(&service, &ledger).await);
        assert_eq!(service.submitted_count(), 0); // guard fired locally
        assert_eq!(session.phase(), SessionPhase::Loaded);
        assert!(session.error().unwrap().contains("short"));

        // Exact tender passes and the cash figures go on the wire
        session.set_cash_tendered(Money::from_minor(10000));
        assert!(session.confirm(&service, &ledger).await);
        let submitted = service.submitted.lock().unwrap();
        assert_eq!(submitted[0].tendered, Some(Money::from_minor(10000)));
        assert!(submitted[0].change.is_zero());
    }

    #[tokio::test]
    async fn test_commit_cash_without_tender_blocked() {
        let service = service_with_detail(detail("42", 7, 10000));
        let ledger = LedgerState::new(19);
        let mut session = CheckoutSession::new();
        session.select_table(&service, 7).await;

        session.set_method(PaymentMethod::Cash);

        assert!(!session.confirm(&service, &ledger).await);
        assert_eq!(service.submitted_count(), 0);
        assert!(session.error().unwrap().contains("required"));
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_entered_values() {
        let service = service_with_detail(detail("42", 7, 10000));
        service
            .commits
            .lock()
            .unwrap()
            .push_back(Err(ClientError::Api {
                status: 502,
                message: "settlement rejected".into(),
            }));
        let ledger = LedgerState::new(19);
        let mut session = CheckoutSession::new();
        session.select_table(&service, 7).await;

        session.set_tip_percent(10);
        session.set_method(PaymentMethod::Cash);
        session.set_cash_tendered(Money::from_minor(20000));

        assert!(!session.confirm(&service, &ledger).await);

        // Back to Loaded with the intent intact: retry without retyping
        assert_eq!(session.phase(), SessionPhase::Loaded);
        assert_eq!(session.error(), Some("settlement rejected"));
        assert_eq!(session.tip_percent(), 10);
        assert_eq!(session.method(), PaymentMethod::Cash);
        assert_eq!(session.cash_tendered(), Some(Money::from_minor(20000)));

        // Ledger untouched by the failed commit
        assert!(ledger.with_ledger(|l| l.get(7).unwrap().total.is_zero()));

        // Retry succeeds (script exhausted; default Ok)
        assert!(session.confirm(&service, &ledger).await);
        assert_eq!(service.submitted_count(), 2);
    }

    #[tokio::test]
    async fn test_confirm_outside_loaded_is_noop() {
        let service = ScriptedService::default();
        let ledger = LedgerState::new(19);
        let mut session = CheckoutSession::new();

        assert!(!session.confirm(&service, &ledger).await);
        assert_eq!(service.submitted_count(), 0);
    }

    // =========================================================================
    // End to end: queue → select → commit → ledger
    // =========================================================================

    #[tokio::test]
    async fn test_end_to_end_order_42_table_7() {
        use chrono::Utc;
        use comanda_core::types::OrderNotice;
        use comanda_core::OrderQueue;

        // Kitchen side: order #42 for table 7 arrives
        let mut queue = OrderQueue::new();
        let now = Utc::now();
        assert!(queue.ingest(
            OrderNotice {
                order_id: "42".into(),
                table_number: 7,
                items: vec![
                    OrderLine::new("Churrasco", 1, Money::from_minor(5000)),
                    OrderLine::new("Jugo natural", 1, Money::from_minor(3000)),
                ],
            },
            now,
        ));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.tickets()[0].elapsed_label(now), "<1 min");

        // Cashier side: select table 7 → Loaded with rawTotal 8000
        let service = service_with_detail(detail("42", 7, 8000));
        let ledger = LedgerState::new(19);
        let mut session = CheckoutSession::new();
        session.select_table(&service, 7).await;
        assert_eq!(session.detail().unwrap().raw_total.minor(), 8000);

        // 15% tip on debit: exact 1200, rounded 1200, due 9200
        session.set_tip_percent(15);
        let b = session.breakdown().unwrap();
        assert_eq!(b.exact_tip.minor(), 1200);
        assert_eq!(b.rounded_tip.minor(), 1200);
        assert_eq!(b.amount_due.minor(), 9200);

        // Commit → table 7 Free/0
        assert!(session.confirm(&service, &ledger).await);
        let entry = ledger.with_ledger(|l| *l.get(7).unwrap());
        assert!(entry.total.is_zero());
        assert_eq!(entry.status, comanda_core::types::TableStatus::Free);
    }
}
