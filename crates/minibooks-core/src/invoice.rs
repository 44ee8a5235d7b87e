//! # Invoice Computation
//!
//! Line item and invoice totals computation.
//!
//! ## Computation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Invoice Totals Pipeline                                │
//! │                                                                         │
//! │  LineInput { qty, unit_price, tax_rate_id }                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_line_amounts() ──► LineAmounts { line_total, line_tax }       │
//! │       │                          (one per line)                         │
//! │       ▼                                                                 │
//! │  aggregate_totals(lines, discount)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  InvoiceTotals {                                                       │
//! │      subtotal   = Σ line_total                                         │
//! │      tax_amount = Σ line_tax                                           │
//! │      total      = subtotal + tax_amount - discount                     │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure: the tax rate table is passed in through the
//! [`TaxRateLookup`] seam, and identical inputs always produce bit-identical
//! outputs. Integer summation makes the totals independent of line order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Quantity, TaxRate};
use crate::validation::{
    validate_discount, validate_line_count, validate_line_name, validate_quantity,
    validate_unit_price,
};

// =============================================================================
// Tax Rate Lookup Seam
// =============================================================================

/// Resolves a tax-rate identifier to its percentage rate.
///
/// The computation core never performs I/O; callers supply an implementation
/// backed by whatever store holds the rates. A `HashMap` implementation is
/// provided for tests and for callers that preload the (small) rate table.
///
/// A `None` result contributes **zero tax** to the line rather than an
/// error. Callers that care about dangling references should log the miss as
/// a data-quality signal before invoking the computation.
pub trait TaxRateLookup {
    /// Returns the rate for the given identifier, or None if unknown.
    fn rate(&self, tax_rate_id: &str) -> Option<TaxRate>;
}

impl TaxRateLookup for HashMap<String, TaxRate> {
    fn rate(&self, tax_rate_id: &str) -> Option<TaxRate> {
        self.get(tax_rate_id).copied()
    }
}

/// The empty lookup: every line computes as untaxed.
impl TaxRateLookup for () {
    fn rate(&self, _tax_rate_id: &str) -> Option<TaxRate> {
        None
    }
}

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// One submitted line item, before computation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineInput {
    /// Display name, frozen onto the stored line item.
    pub name: String,
    pub description: Option<String>,
    /// Quantity in fixed-point thousandths. Must be positive.
    pub quantity: Quantity,
    /// Unit price. Must be non-negative.
    pub unit_price: Money,
    /// Optional tax rate reference; None (or an unknown id) means untaxed.
    pub tax_rate_id: Option<String>,
}

/// Computed amounts for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineAmounts {
    /// quantity × unit price.
    pub line_total: Money,
    /// line_total × rate, or zero when the line is untaxed.
    pub line_tax: Money,
}

/// The computed totals of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    /// subtotal + tax_amount - discount_amount. Never negative: a discount
    /// larger than subtotal + tax is rejected during aggregation.
    pub total: Money,
}

// =============================================================================
// Line Calculator
// =============================================================================

/// Computes the extended total and tax contribution of one line item.
///
/// ## Errors
/// - Empty/overlong name, non-positive quantity, or negative unit price
///   reject with a validation error before any arithmetic runs.
///
/// ## Unknown Tax Rates
/// An unresolvable `tax_rate_id` is treated as untaxed, not as an error.
/// Line items keep their rate reference even after the rate is deleted, and
/// a dangling reference must not make historical invoices uneditable.
///
/// ## Example
/// ```rust
/// use minibooks_core::invoice::{compute_line_amounts, LineInput};
/// use minibooks_core::money::Money;
/// use minibooks_core::types::{Quantity, TaxRate};
/// use std::collections::HashMap;
///
/// let rates = HashMap::from([("vat14".to_string(), TaxRate::from_bps(1400))]);
/// let line = LineInput {
///     name: "Design work".to_string(),
///     description: None,
///     quantity: Quantity::from_units(2),
///     unit_price: Money::from_cents(10_000),
///     tax_rate_id: Some("vat14".to_string()),
/// };
///
/// let amounts = compute_line_amounts(&line, &rates).unwrap();
/// assert_eq!(amounts.line_total.cents(), 20_000); // $200.00
/// assert_eq!(amounts.line_tax.cents(), 2_800);    // $28.00
/// ```
pub fn compute_line_amounts(
    line: &LineInput,
    rates: &impl TaxRateLookup,
) -> CoreResult<LineAmounts> {
    validate_line_name(&line.name)?;
    validate_quantity(line.quantity)?;
    validate_unit_price(line.unit_price)?;

    let line_total = line.unit_price.multiply_quantity(line.quantity);

    let line_tax = match line.tax_rate_id.as_deref().and_then(|id| rates.rate(id)) {
        Some(rate) => line_total.tax_amount(rate),
        None => Money::zero(),
    };

    Ok(LineAmounts {
        line_total,
        line_tax,
    })
}

// =============================================================================
// Totals Aggregator
// =============================================================================

/// Reduces computed line amounts into invoice totals.
///
/// ## Determinism
/// Summation is plain i64 addition, so the result is identical for any
/// permutation of `lines` - there is no floating-point drift to order.
///
/// ## Errors
/// - Zero lines, or more than [`crate::MAX_INVOICE_LINES`]
/// - Negative discount
/// - Discount exceeding subtotal + tax ([`CoreError::DiscountExceedsTotal`]);
///   the total is never allowed to go negative
pub fn aggregate_totals(lines: &[LineAmounts], discount: Money) -> CoreResult<InvoiceTotals> {
    validate_line_count(lines.len())?;
    validate_discount(discount)?;

    let subtotal: Money = lines.iter().map(|l| l.line_total).sum();
    let tax_amount: Money = lines.iter().map(|l| l.line_tax).sum();

    let gross = subtotal + tax_amount;
    if discount > gross {
        return Err(CoreError::DiscountExceedsTotal {
            discount,
            max: gross,
        });
    }

    Ok(InvoiceTotals {
        subtotal,
        tax_amount,
        discount_amount: discount,
        total: gross - discount,
    })
}

/// Computes invoice totals straight from submitted line inputs.
///
/// Convenience composition of [`compute_line_amounts`] over every line and
/// [`aggregate_totals`]; callers that also need the per-line amounts (to
/// persist line items) run the two steps themselves.
pub fn compute_invoice_totals(
    lines: &[LineInput],
    discount: Money,
    rates: &impl TaxRateLookup,
) -> CoreResult<InvoiceTotals> {
    validate_line_count(lines.len())?;

    let amounts = lines
        .iter()
        .map(|line| compute_line_amounts(line, rates))
        .collect::<CoreResult<Vec<_>>>()?;

    aggregate_totals(&amounts, discount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::MAX_INVOICE_LINES;

    fn vat14() -> HashMap<String, TaxRate> {
        HashMap::from([("vat14".to_string(), TaxRate::from_bps(1400))])
    }

    fn line(
        qty_milli: i64,
        price_cents: i64,
        tax_rate_id: Option<&str>,
    ) -> LineInput {
        LineInput {
            name: "Line".to_string(),
            description: None,
            quantity: Quantity::from_milli(qty_milli),
            unit_price: Money::from_cents(price_cents),
            tax_rate_id: tax_rate_id.map(str::to_string),
        }
    }

    #[test]
    fn test_taxed_line() {
        // 2 × $100.00 at 14% → total $200.00, tax $28.00
        let amounts = compute_line_amounts(&line(2000, 10_000, Some("vat14")), &vat14()).unwrap();
        assert_eq!(amounts.line_total.cents(), 20_000);
        assert_eq!(amounts.line_tax.cents(), 2_800);
    }

    #[test]
    fn test_untaxed_line() {
        let amounts = compute_line_amounts(&line(1000, 50_000, None), &vat14()).unwrap();
        assert_eq!(amounts.line_total.cents(), 50_000);
        assert_eq!(amounts.line_tax.cents(), 0);
    }

    #[test]
    fn test_unknown_tax_rate_contributes_zero_tax() {
        let amounts =
            compute_line_amounts(&line(1000, 50_000, Some("deleted-rate")), &vat14()).unwrap();
        assert_eq!(amounts.line_total.cents(), 50_000);
        assert_eq!(amounts.line_tax.cents(), 0);
    }

    #[test]
    fn test_line_validation() {
        let err = compute_line_amounts(&line(0, 100, None), &()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));

        let err = compute_line_amounts(&line(1000, -100, None), &()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));

        let nameless = LineInput {
            name: "  ".to_string(),
            ..line(1000, 100, None)
        };
        assert!(compute_line_amounts(&nameless, &()).is_err());
    }

    #[test]
    fn test_line_computation_is_deterministic() {
        // Bit-identical output for identical input, run twice.
        let input = line(2500, 99, Some("vat14"));
        let a = compute_line_amounts(&input, &vat14()).unwrap();
        let b = compute_line_amounts(&input, &vat14()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_totals_worked_example() {
        // 2 × $100.00 at 14%, no discount → 200 / 28 / 228
        let totals =
            compute_invoice_totals(&[line(2000, 10_000, Some("vat14"))], Money::zero(), &vat14())
                .unwrap();
        assert_eq!(totals.subtotal.cents(), 20_000);
        assert_eq!(totals.tax_amount.cents(), 2_800);
        assert_eq!(totals.total.cents(), 22_800);
    }

    #[test]
    fn test_totals_with_discount() {
        // 1 × $500.00, no tax, $50.00 discount → 500 / 0 / 450
        let totals =
            compute_invoice_totals(&[line(1000, 50_000, None)], Money::from_cents(5_000), &())
                .unwrap();
        assert_eq!(totals.subtotal.cents(), 50_000);
        assert_eq!(totals.tax_amount.cents(), 0);
        assert_eq!(totals.discount_amount.cents(), 5_000);
        assert_eq!(totals.total.cents(), 45_000);
    }

    #[test]
    fn test_totals_order_independent() {
        let rates = vat14();
        let a = line(2000, 10_000, Some("vat14"));
        let b = line(1000, 33_333, None);
        let c = line(2500, 99, Some("vat14"));

        let forward = compute_invoice_totals(
            &[a.clone(), b.clone(), c.clone()],
            Money::from_cents(100),
            &rates,
        )
        .unwrap();
        let reversed =
            compute_invoice_totals(&[c, b, a], Money::from_cents(100), &rates).unwrap();

        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_discount_exceeding_gross_is_rejected() {
        // subtotal + tax = $228.00; $300.00 discount must not produce a
        // negative total
        let err = compute_invoice_totals(
            &[line(2000, 10_000, Some("vat14"))],
            Money::from_cents(30_000),
            &vat14(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DiscountExceedsTotal { .. }));
    }

    #[test]
    fn test_discount_equal_to_gross_yields_zero_total() {
        let totals = compute_invoice_totals(
            &[line(1000, 10_000, None)],
            Money::from_cents(10_000),
            &(),
        )
        .unwrap();
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_negative_discount_is_rejected() {
        let err =
            compute_invoice_totals(&[line(1000, 10_000, None)], Money::from_cents(-1), &())
                .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_line_count_bounds() {
        let err = compute_invoice_totals(&[], Money::zero(), &()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));

        let too_many: Vec<LineInput> = (0..=MAX_INVOICE_LINES)
            .map(|_| line(1000, 100, None))
            .collect();
        let err = compute_invoice_totals(&too_many, Money::zero(), &()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_aggregate_from_precomputed_lines() {
        let amounts = vec![
            LineAmounts {
                line_total: Money::from_cents(20_000),
                line_tax: Money::from_cents(2_800),
            },
            LineAmounts {
                line_total: Money::from_cents(50_000),
                line_tax: Money::zero(),
            },
        ];
        let totals = aggregate_totals(&amounts, Money::from_cents(800)).unwrap();
        assert_eq!(totals.subtotal.cents(), 70_000);
        assert_eq!(totals.tax_amount.cents(), 2_800);
        assert_eq!(totals.total.cents(), 72_000);
    }
}
