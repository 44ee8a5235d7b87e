//! # Repository Module
//!
//! Database repository implementations for Minibooks.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  HTTP Handler                                                          │
//! │       │                                                                 │
//! │       │  db.payments().record(&new_payment)                            │
//! │       ▼                                                                 │
//! │  PaymentRepository                                                     │
//! │  ├── record(&self, new)       ← owns the transaction                   │
//! │  └── list_for_invoice(&self, invoice_id)                               │
//! │       │                                                                 │
//! │       │  SQL + minibooks-core computation                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place per entity                             │
//! │  • Transaction boundaries are impossible to forget at call sites       │
//! │  • Business math stays in minibooks-core where it is unit-tested       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`invoice::InvoiceRepository`] - Invoice creation, editing, lifecycle
//! - [`payment::PaymentRepository`] - Atomic payment application
//! - [`tax::TaxRepository`] - Tax rates and the computation lookup table
//! - [`expense::ExpenseRepository`] - Expenses and categories
//! - [`report::ReportRepository`] - Dashboard and report queries

pub mod expense;
pub mod invoice;
pub mod payment;
pub mod report;
pub mod tax;
