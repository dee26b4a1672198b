//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (table, amounts)
//! 3. Errors are enum variants, never String
//! 4. Expected conditions (duplicate ingest, absent id) are NOT errors;
//!    queue/ledger methods report them as status booleans instead

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule violations.
///
/// These block the attempted action synchronously and are never sent
/// over the network.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cash payment where the tendered amount does not cover the
    /// amount due.
    #[error("cash tendered is short by {short} of the {due} due")]
    CashShortfall { due: Money, short: Money },

    /// No order detail is loaded for the attempted operation.
    #[error("no order is loaded for payment")]
    NoOrderLoaded,

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: &'static str },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
