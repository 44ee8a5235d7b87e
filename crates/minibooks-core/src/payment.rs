//! # Payment Application
//!
//! Applies a payment to an invoice balance and derives the resulting status.
//!
//! ## Status Transition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Payment Application                                   │
//! │                                                                         │
//! │  apply_payment(balance, amount)                                        │
//! │       │                                                                 │
//! │       ├── amount <= 0?            → ValidationError                    │
//! │       ├── status PAID/CANCELLED?  → InvoiceClosed                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  paid' = paid + amount                                                 │
//! │                                                                         │
//! │  status' = PAID     if paid' >= total                                  │
//! │            PARTIAL  if 0 < paid' < total                               │
//! │            (unchanged otherwise)                                       │
//! │                                                                         │
//! │  overpayment = max(paid' - total, 0)   (accepted, reported)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The function is pure. The persistence layer is responsible for executing
//! the payment insert and the `(paid_amount, status)` update as one atomic
//! transaction, so that two concurrent payments can never overwrite each
//! other's effect.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Invoice, InvoiceStatus};
use crate::validation::validate_payment_amount;

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// The slice of invoice state that payment application reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceBalance {
    pub total: Money,
    pub paid_amount: Money,
    pub status: InvoiceStatus,
}

impl From<&Invoice> for InvoiceBalance {
    fn from(invoice: &Invoice) -> Self {
        InvoiceBalance {
            total: invoice.total(),
            paid_amount: invoice.paid_amount(),
            status: invoice.status,
        }
    }
}

/// The result of applying one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentOutcome {
    /// New paid-to-date amount: previous paid amount + payment amount.
    pub paid_amount: Money,
    /// New status, derived purely from `(paid_amount, total)`.
    pub status: InvoiceStatus,
    /// Amount by which the invoice is now overpaid; zero in the normal case.
    /// Overpayment is accepted (the customer rounded up, or paid twice by
    /// mistake) but callers should surface it - there is no refund concept.
    pub overpayment: Money,
}

// =============================================================================
// Payment Application
// =============================================================================

/// Applies a payment amount to an invoice balance.
///
/// ## Errors
/// - `amount <= 0` → validation error
/// - invoice already PAID or CANCELLED → [`CoreError::InvoiceClosed`]
///
/// ## Guarantees
/// - `outcome.paid_amount == balance.paid_amount + amount` exactly
/// - the status never moves backward: a PARTIAL invoice can only stay
///   PARTIAL or become PAID
///
/// ## Example
/// ```rust
/// use minibooks_core::money::Money;
/// use minibooks_core::payment::{apply_payment, InvoiceBalance};
/// use minibooks_core::types::InvoiceStatus;
///
/// let balance = InvoiceBalance {
///     total: Money::from_cents(100_000),
///     paid_amount: Money::zero(),
///     status: InvoiceStatus::Sent,
/// };
///
/// let outcome = apply_payment(&balance, Money::from_cents(40_000)).unwrap();
/// assert_eq!(outcome.paid_amount.cents(), 40_000);
/// assert_eq!(outcome.status, InvoiceStatus::Partial);
/// ```
pub fn apply_payment(balance: &InvoiceBalance, amount: Money) -> CoreResult<PaymentOutcome> {
    validate_payment_amount(amount)?;

    if !balance.status.accepts_payment() {
        return Err(CoreError::InvoiceClosed {
            status: balance.status,
        });
    }

    let paid_amount = balance.paid_amount + amount;

    let status = if paid_amount >= balance.total {
        InvoiceStatus::Paid
    } else if paid_amount.is_positive() {
        InvoiceStatus::Partial
    } else {
        balance.status
    };

    let overpayment = if paid_amount > balance.total {
        paid_amount - balance.total
    } else {
        Money::zero()
    };

    Ok(PaymentOutcome {
        paid_amount,
        status,
        overpayment,
    })
}

// =============================================================================
// Explicit Status Updates
// =============================================================================

/// Checks that a status may be assigned by an explicit lifecycle update.
///
/// PARTIAL and PAID are derived exclusively by [`apply_payment`]; allowing a
/// caller to set them directly would desynchronize status from the recorded
/// payments.
pub fn validate_explicit_status(status: InvoiceStatus) -> CoreResult<()> {
    if status.is_payment_driven() {
        return Err(CoreError::StatusNotAssignable { status });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
