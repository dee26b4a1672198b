//! # Tender Calculator
//!
//! Pure tip/rounding and payment-due computation.
//!
//! ## Rounding Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Two Independent Rounding Paths                   │
//! │                                                                     │
//! │  raw_total ──┬─► exact_tip = round(raw × pct / 100)                 │
//! │              │        │                                             │
//! │              │        ├─► rounded_tip = to_hundred(exact_tip)       │
//! │              │        │        │                                    │
//! │              │        │        └─► total_with_rounded_tip           │
//! │              │        │             = raw + rounded_tip             │
//! │              │        │             = AMOUNT DUE (charged/tendered) │
//! │              │        │                                             │
//! │              │        └─► exact_total = raw + exact_tip             │
//! │              │                 │                                    │
//! │              │                 └─► final_rounded_total              │
//! │              │                      = to_hundred(exact_total)       │
//! │              │                      (display parity only)           │
//! │              │                                                      │
//! │  The two paths are NOT guaranteed equal and both are surfaced;      │
//! │  the tills print both figures. Keep the computations distinct.      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every figure is derived, never stored: recompute on each input
//! change.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::validation::validate_tip_percent;

// =============================================================================
// Tender Breakdown
// =============================================================================

/// Every derived figure of a payment intent, computed in one pass.
///
/// Deterministic given `(raw_total, tip_percent, method, cash_tendered)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TenderBreakdown {
    /// Sum of line subtotals, before tip.
    pub raw_total: Money,

    /// Tip percentage the breakdown was computed for.
    pub tip_percent: u8,

    /// `round(raw_total × tip_percent / 100)`, half-up.
    pub exact_tip: Money,

    /// Exact tip rounded to the nearest hundred, ties up.
    pub rounded_tip: Money,

    /// `raw_total + exact_tip`.
    pub exact_total: Money,

    /// `raw_total + rounded_tip`; the figure charged or tendered
    /// against.
    pub total_with_rounded_tip: Money,

    /// `exact_total` rounded to the nearest hundred; display parity
    /// with `total_with_rounded_tip`, not guaranteed equal to it.
    pub final_rounded_total: Money,

    /// Alias for `total_with_rounded_tip`.
    pub amount_due: Money,

    /// Cash only: `max(tendered − amount_due, 0)`. Zero otherwise.
    pub change: Money,

    /// Cash only: `max(amount_due − tendered, 0)`. Zero otherwise.
    pub shortfall: Money,
}

impl TenderBreakdown {
    /// Computes the full breakdown.
    ///
    /// For Cash, a missing tender computes as zero tendered (the
    /// shortfall then equals the amount due); the commit guard is what
    /// rejects the missing value, see [`TenderBreakdown::validate_for_commit`].
    pub fn compute(
        raw_total: Money,
        tip_percent: u8,
        method: PaymentMethod,
        cash_tendered: Option<Money>,
    ) -> Self {
        let exact_tip = raw_total.percent_of(tip_percent);
        let rounded_tip = exact_tip.round_to_hundred();
        let exact_total = raw_total + exact_tip;
        let total_with_rounded_tip = raw_total + rounded_tip;
        let final_rounded_total = exact_total.round_to_hundred();
        let amount_due = total_with_rounded_tip;

        let (change, shortfall) = match method {
            PaymentMethod::Cash => {
                let tendered = cash_tendered.unwrap_or_default();
                (tendered.excess_over(amount_due), amount_due.excess_over(tendered))
            }
            // Card terminals charge the exact due; nothing to return
            PaymentMethod::Debit | PaymentMethod::Credit => (Money::zero(), Money::zero()),
        };

        TenderBreakdown {
            raw_total,
            tip_percent,
            exact_tip,
            rounded_tip,
            exact_total,
            total_with_rounded_tip,
            final_rounded_total,
            amount_due,
            change,
            shortfall,
        }
    }

    /// Synchronous commit guard; nothing reaches the network when this
    /// fails.
    ///
    /// ## Rules
    /// - tip percent must be 0..=100
    /// - Cash requires a tendered amount
    /// - Cash with a shortfall is rejected (a literal zero tender
    ///   against a nonzero due is short, it does not slip through)
    pub fn validate_for_commit(
        &self,
        method: PaymentMethod,
        cash_tendered: Option<Money>,
    ) -> CoreResult<()> {
        validate_tip_percent(self.tip_percent)?;

        if method == PaymentMethod::Cash {
            if cash_tendered.is_none() {
                return Err(ValidationError::Required {
                    field: "cash tendered",
                }
                .into());
            }
            if self.shortfall.is_positive() {
                return Err(CoreError::CashShortfall {
                    due: self.amount_due,
                    short: self.shortfall,
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
