//! # minibooks-db: Database Layer for Minibooks
//!
//! This crate provides database access for the Minibooks accounting backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Minibooks Data Flow                               │
//! │                                                                         │
//! │  HTTP Handler (create_invoice / record_payment / reports)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    minibooks-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ invoice.rs    │    │  (embedded)  │  │   │
//! │  │   │               │    │ payment.rs    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ tax.rs        │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ expense.rs    │    │ ...          │  │   │
//! │  │   │ Management    │    │ report.rs     │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │          totals & status math delegated to minibooks-core     │   │
//! │  └────────────────────────────────┼───────────────────────────────┘   │
//! │                                   ▼                                     │
//! │                           SQLite Database                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Boundaries
//!
//! Two operations carry real concurrency hazards and are owned entirely by
//! this crate:
//!
//! - **Invoice creation** draws its sequential number from an atomic counter
//!   inside the same transaction that inserts the invoice, so two
//!   simultaneous creations can never mint the same number.
//! - **Payment recording** reads the invoice, applies the pure status
//!   transition from minibooks-core, inserts the payment, and updates the
//!   invoice behind a compare-and-swap - all in one transaction, retried on
//!   conflict - so concurrent payments can never lose an update.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use minibooks_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/minibooks.db")).await?;
//!
//! let invoice = db.invoices().create(&new_invoice).await?;
//! let receipt = db.payments().record(&new_payment).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::expense::{ExpenseRepository, NewExpense};
pub use repository::invoice::{InvoiceFilter, InvoiceRepository, NewInvoice};
pub use repository::payment::{NewPayment, PaymentReceipt, PaymentRepository};
pub use repository::report::ReportRepository;
pub use repository::tax::{TaxRateTable, TaxRepository};
