//! # Error Types
//!
//! Domain-specific error types for minibooks-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  minibooks-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  minibooks-db errors (separate crate)                                  │
//! │  └── DbError          - Not-found, conflicts, query failures           │
//! │                                                                         │
//! │  HTTP layer (external)                                                 │
//! │  └── maps each variant to a status code for the client                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → HTTP response           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, statuses, field names)
//! 3. Errors are enum variants, never String
//! 4. The core performs no logging or retries; errors are plain return values

use thiserror::Error;

use crate::money::Money;
use crate::types::InvoiceStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are surfaced
/// synchronously to the caller and are never retried.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The discount would push the invoice total below zero.
    ///
    /// ## When This Occurs
    /// - Caller supplies a discount larger than subtotal + tax
    ///
    /// A negative invoice total has no meaning here (there is no credit-note
    /// concept), so the computation rejects it instead of clamping.
    #[error("Discount {discount} exceeds invoice amount {max}")]
    DiscountExceedsTotal { discount: Money, max: Money },

    /// A payment was attempted against an invoice in a terminal state.
    ///
    /// ## When This Occurs
    /// - Invoice is already PAID (fully settled)
    /// - Invoice is CANCELLED
    ///
    /// ## User Workflow
    /// ```text
    /// Record payment ($400)
    ///      │
    ///      ▼
    /// Invoice status: CANCELLED
    ///      │
    ///      ▼
    /// InvoiceClosed { status: Cancelled }
    ///      │
    ///      ▼
    /// UI shows: "This invoice no longer accepts payments"
    /// ```
    #[error("Invoice is {status:?} and no longer accepts payments")]
    InvoiceClosed { status: InvoiceStatus },

    /// A lifecycle update tried to set a payment-driven status.
    ///
    /// PARTIAL and PAID are a pure function of payments applied against the
    /// invoice total; they can never be assigned directly.
    #[error("Status {status:?} can only be reached through payment application")]
    StatusNotAssignable { status: InvoiceStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DiscountExceedsTotal {
            discount: Money::from_cents(60_000),
            max: Money::from_cents(50_000),
        };
        assert_eq!(
            err.to_string(),
            "Discount $600.00 exceeds invoice amount $500.00"
        );

        let err = CoreError::InvoiceClosed {
            status: InvoiceStatus::Cancelled,
        };
        assert_eq!(
            err.to_string(),
            "Invoice is Cancelled and no longer accepts payments"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
