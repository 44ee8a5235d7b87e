//! # minibooks-core: Pure Business Logic for Minibooks
//!
//! This crate is the **heart** of Minibooks, a small-business accounting
//! backend. It contains every business rule as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Minibooks Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Browser Front End (external)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  HTTP Handlers (external)                       │   │
//! │  │    create_invoice, record_payment, dashboard, reports           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ minibooks-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │  │  money  │ │ invoice │ │ payment │ │numbering │ │reporting│ │   │
//! │  │  │  Money  │ │ totals  │ │ status  │ │ INV-0001 │ │ P&L etc │ │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                minibooks-db (Database Layer)                    │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Invoice, Payment, Expense, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`invoice`] - Line item and invoice totals computation
//! - [`payment`] - Payment application and status transitions
//! - [`numbering`] - Invoice number formatting
//! - [`reporting`] - Dashboard and report reducers
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use minibooks_core::invoice::{compute_invoice_totals, LineInput};
//! use minibooks_core::money::Money;
//! use minibooks_core::types::{Quantity, TaxRate};
//! use std::collections::HashMap;
//!
//! let rates = HashMap::from([("vat14".to_string(), TaxRate::from_bps(1400))]);
//! let lines = vec![LineInput {
//!     name: "Consulting".to_string(),
//!     description: None,
//!     quantity: Quantity::from_units(2),
//!     unit_price: Money::from_cents(10_000), // $100.00
//!     tax_rate_id: Some("vat14".to_string()),
//! }];
//!
//! let totals = compute_invoice_totals(&lines, Money::zero(), &rates).unwrap();
//! assert_eq!(totals.subtotal.cents(), 20_000); // $200.00
//! assert_eq!(totals.tax_amount.cents(), 2_800); // $28.00
//! assert_eq!(totals.total.cents(), 22_800); // $228.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod numbering;
pub mod payment;
pub mod reporting;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use minibooks_core::Money` instead of
// `use minibooks_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{compute_invoice_totals, compute_line_amounts, InvoiceTotals, LineInput};
pub use money::Money;
pub use payment::{apply_payment, InvoiceBalance, PaymentOutcome};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix for human-readable invoice numbers (`INV-00042`).
pub const INVOICE_NUMBER_PREFIX: &str = "INV-";

/// Minimum digit width of the sequential part of an invoice number.
///
/// Sequences beyond 99999 widen naturally instead of being truncated.
pub const INVOICE_NUMBER_WIDTH: usize = 5;

/// Maximum line items allowed on a single invoice.
///
/// ## Business Reason
/// Keeps payloads and totals computation bounded; a small business invoice
/// with more lines than this is almost certainly a client bug.
pub const MAX_INVOICE_LINES: usize = 100;

/// Maximum quantity of a single line item (in whole units).
///
/// ## Business Reason
/// Prevents accidental over-billing (e.g., typing 1000000 instead of 100)
/// and keeps the fixed-point multiply far away from overflow.
pub const MAX_LINE_QUANTITY_UNITS: i64 = 1_000_000;
