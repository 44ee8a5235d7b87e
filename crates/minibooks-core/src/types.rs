//! # Domain Types
//!
//! Core domain types used throughout Minibooks.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Invoice      │   │  InvoiceItem    │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  invoice_number │   │  invoice_id(FK) │   │  invoice_id(FK) │       │
//! │  │  status         │   │  quantity_milli │   │  method         │       │
//! │  │  total_cents    │   │  line_total     │   │  amount_cents   │       │
//! │  │  paid_cents     │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  InvoiceStatus  │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Draft … Paid   │   │  Cash, Check,   │       │
//! │  │  1400 = 14%     │   │  Cancelled      │   │  BankTransfer…  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (`invoice_number`) - human-readable
//!
//! Customers, vendors and currencies are owned by external services and are
//! referenced by opaque `customer_id` / `vendor_id` strings and ISO
//! `currency_code` only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1400 bps = 14% (e.g., a VAT rate)
///
/// Expressing the percentage as an integer keeps tax math in exact integer
/// arithmetic; the rate is never used as a divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a whole percentage (14 → 14%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// Line item quantity in thousandths of a unit.
///
/// ## Why Thousandths?
/// Invoices routinely bill fractional quantities (2.5 hours, 0.75 kg).
/// Storing thousandths keeps the value an exact integer, the same trick
/// [`Money`] uses with cents:
///
/// ```text
/// 2 units    = Quantity(2000)
/// 2.5 units  = Quantity(2500)
/// 0.001 unit = Quantity(1)   (smallest representable)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from thousandths of a unit.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a whole-unit quantity (3 → 3.000).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * 1000)
    }

    /// Returns the quantity in thousandths of a unit.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Checks if the quantity is positive (> 0).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the quantity has a fractional part.
    #[inline]
    pub const fn is_fractional(&self) -> bool {
        self.0 % 1000 != 0
    }
}

/// Display trims trailing zeros: `2`, `2.5`, `0.125`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0 / 1000;
        let frac = (self.0 % 1000).abs();
        if frac == 0 {
            write!(f, "{}", units)
        } else {
            let s = format!("{:03}", frac);
            write!(f, "{}.{}", units, s.trim_end_matches('0'))
        }
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// The lifecycle status of an invoice.
///
/// ## State Machine
/// ```text
/// DRAFT ──► SENT ──► VIEWED ──► APPROVED          (explicit updates)
///   │         │         │           │
///   └─────────┴────┬────┴───────────┘
///                  │ payment applied
///                  ▼
///              PARTIAL ──► PAID                   (payment-driven ONLY)
///
/// any non-terminal ──► CANCELLED                  (explicit update)
/// ```
///
/// PARTIAL and PAID are a pure function of `(paid_amount, total)` and are
/// never assigned directly. PAID and CANCELLED are terminal: they accept no
/// further payments and no automatic backward transition exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Being edited, not yet issued to the customer.
    Draft,
    /// Issued to the customer.
    Sent,
    /// Opened by the customer.
    Viewed,
    /// Accepted by the customer.
    Approved,
    /// Partially paid (0 < paid < total).
    Partial,
    /// Fully settled (paid >= total).
    Paid,
    /// Withdrawn; accepts no further activity.
    Cancelled,
}

impl InvoiceStatus {
    /// Terminal states accept no further payments.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Whether a payment may be applied in this state.
    #[inline]
    pub const fn accepts_payment(&self) -> bool {
        !self.is_terminal()
    }

    /// Awaiting payment: issued (or still draft) with nothing collected yet.
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Draft
                | InvoiceStatus::Sent
                | InvoiceStatus::Viewed
                | InvoiceStatus::Approved
        )
    }

    /// States that only payment application may produce.
    #[inline]
    pub const fn is_payment_driven(&self) -> bool {
        matches!(self, InvoiceStatus::Partial | InvoiceStatus::Paid)
    }

    /// Whether income against this invoice counts as collected revenue.
    #[inline]
    pub const fn counts_as_income(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Partial)
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    CreditCard,
    Paypal,
    Check,
    Other,
}

// =============================================================================
// Tax
// =============================================================================

/// A named tax rate (e.g. "VAT 14%") referenced by invoice line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tax {
    pub id: String,
    pub name: String,
    /// Rate in basis points (1400 = 14%).
    pub rate_bps: u32,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Tax {
    /// Returns the rate as a TaxRate.
    #[inline]
    pub fn rate(&self) -> TaxRate {
        TaxRate::from_bps(self.rate_bps)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// An issued (or draft) invoice.
///
/// `subtotal/tax/discount/total` are fixed by totals computation at create or
/// edit time; `paid_amount` and the payment-driven part of `status` change
/// only through payment application.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Human-readable sequential number (`INV-00042`). Unique.
    pub invoice_number: String,
    /// Customer reference (owned by an external service).
    pub customer_id: String,
    /// ISO 4217 code of the invoice currency.
    pub currency_code: String,
    #[ts(as = "String")]
    pub invoice_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    /// Sum of all payments applied so far. Monotonically non-decreasing;
    /// refunds are not supported.
    pub paid_amount_cents: i64,
    pub notes: Option<String>,
    pub terms: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Returns the tax amount as Money.
    #[inline]
    pub fn tax_amount(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    /// Returns the discount as Money.
    #[inline]
    pub fn discount_amount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the amount paid so far as Money.
    #[inline]
    pub fn paid_amount(&self) -> Money {
        Money::from_cents(self.paid_amount_cents)
    }

    /// Remaining balance. Negative when the invoice was overpaid.
    #[inline]
    pub fn outstanding(&self) -> Money {
        self.total() - self.paid_amount()
    }

    /// Whether the invoice is past due and still collectible.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && !self.status.is_terminal()
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line item on an invoice.
/// Name and description are frozen at computation time; editing an invoice
/// replaces the whole line set rather than mutating rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Quantity in thousandths of a unit (2500 = 2.5).
    pub quantity_milli: i64,
    /// Unit price in cents.
    pub unit_price_cents: i64,
    /// Optional reference to a tax rate; None means untaxed.
    pub tax_rate_id: Option<String>,
    /// Extended total (quantity × unit price).
    pub line_total_cents: i64,
    /// Tax contribution of this line.
    pub tax_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Returns the quantity.
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// Returns the line tax as Money.
    #[inline]
    pub fn line_tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment applied against a single invoice.
/// Payments are immutable and append-only; corrections are new records.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    /// Amount paid in cents. Always positive.
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub payment_date: DateTime<Utc>,
    pub method: PaymentMethod,
    /// External reference (bank transaction id, check number, etc.).
    pub reference: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Expenses
// =============================================================================

/// A category for grouping expenses in reports.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExpenseCategory {
    pub id: String,
    pub name: String,
    /// Display color for charts (hex string).
    pub color: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A recorded business expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub category_id: String,
    /// Vendor reference (owned by an external service).
    pub vendor_id: Option<String>,
    pub currency_code: String,
    pub description: String,
    pub reference: Option<String>,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub expense_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Returns the expense amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
