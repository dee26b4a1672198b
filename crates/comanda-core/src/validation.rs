//! # Validation Module
//!
//! Input validation for values crossing into the core.
//!
//! Validation errors are synchronous: they block the attempted action
//! and never produce a network call.
//!
//! ## Usage
//! ```rust
//! use comanda_core::validation::{validate_tip_percent, validate_table_number};
//!
//! validate_tip_percent(15).unwrap();
//! validate_table_number(7, 19).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_TIP_PERCENT;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a tip percentage.
///
/// ## Rules
/// - Must be between 0 and 100 (presets are 0/10/15, free entry allowed)
pub fn validate_tip_percent(pct: u8) -> ValidationResult<()> {
    if pct > MAX_TIP_PERCENT {
        return Err(ValidationError::OutOfRange {
            field: "tip percent",
            min: 0,
            max: MAX_TIP_PERCENT as i64,
        });
    }

    Ok(())
}

/// Validates a table number against the configured table count.
///
/// ## Rules
/// - Must be within 1..=table_count (the grid has fixed cardinality)
pub fn validate_table_number(table: u32, table_count: u32) -> ValidationResult<()> {
    if table < 1 || table > table_count {
        return Err(ValidationError::OutOfRange {
            field: "table number",
            min: 1,
            max: table_count as i64,
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantity" });
    }

    Ok(())
}

/// Validates an amount that must not be negative (prices, totals,
/// tendered cash).
pub fn validate_amount(field: &'static str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative { field });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an order id.
///
/// ## Rules
/// - Opaque and server-assigned, so the only local rule is non-empty.
///   Events without an id are dropped before reaching the queue; this
///   is the same rule applied at the request boundary.
pub fn validate_order_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required { field: "order id" });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
