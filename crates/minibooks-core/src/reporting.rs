//! # Report Reducers
//!
//! Pure aggregation functions behind the dashboard and report views.
//!
//! ## Division of Labor
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reporting Pipeline                                   │
//! │                                                                         │
//! │  minibooks-db (ReportRepository)                                       │
//! │  ├── fetches invoices/expenses for the requested period                │
//! │  └── nothing else - no arithmetic in SQL beyond date filters           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE - pure reducers                                           │
//! │  ├── income_total / expense_total / profit_loss                        │
//! │  ├── pending_summary / income_summary                                  │
//! │  └── category_breakdown / monthly_totals                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  HTTP layer serializes the result for the dashboard                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keeping the arithmetic here means every number on the dashboard is
//! covered by plain unit tests with no database in sight.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Expense, ExpenseCategory, Invoice, InvoiceStatus};

// =============================================================================
// Result Types
// =============================================================================

/// Count and value of invoices still awaiting payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PendingSummary {
    pub count: usize,
    pub total: Money,
}

/// Income vs. expenses over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitLoss {
    /// Collected revenue: paid amounts of PAID and PARTIAL invoices.
    pub income: Money,
    pub expenses: Money,
    /// income - expenses; negative when the period ran at a loss.
    pub profit: Money,
}

/// One invoice row of the income summary report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IncomeSummaryRow {
    pub invoice_number: String,
    pub customer_id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub total: Money,
    pub paid: Money,
    pub status: InvoiceStatus,
    pub currency_code: String,
}

/// The income summary report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IncomeSummary {
    pub rows: Vec<IncomeSummaryRow>,
    pub total: Money,
    pub total_paid: Money,
    /// total - total_paid.
    pub outstanding: Money,
}

/// Expense total for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryTotal {
    pub name: String,
    pub color: Option<String>,
    pub total: Money,
}

/// Total for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyTotal {
    pub month: String,
    pub total: Money,
}

// =============================================================================
// Reducers
// =============================================================================

/// Collected revenue across the given invoices: the paid amounts of
/// invoices that are PAID or PARTIAL. Unpaid totals are not income.
pub fn income_total(invoices: &[Invoice]) -> Money {
    invoices
        .iter()
        .filter(|inv| inv.status.counts_as_income())
        .map(|inv| inv.paid_amount())
        .sum()
}

/// Count and summed total of invoices still awaiting payment
/// (DRAFT, SENT, VIEWED, APPROVED).
pub fn pending_summary(invoices: &[Invoice]) -> PendingSummary {
    let pending: Vec<&Invoice> = invoices
        .iter()
        .filter(|inv| inv.status.is_pending())
        .collect();

    PendingSummary {
        count: pending.len(),
        total: pending.iter().map(|inv| inv.total()).sum(),
    }
}

/// Sum of all expense amounts.
pub fn expense_total(expenses: &[Expense]) -> Money {
    expenses.iter().map(|e| e.amount()).sum()
}

/// Income vs. expenses for whatever period the inputs were fetched over.
pub fn profit_loss(invoices: &[Invoice], expenses: &[Expense]) -> ProfitLoss {
    let income = income_total(invoices);
    let spent = expense_total(expenses);

    ProfitLoss {
        income,
        expenses: spent,
        profit: income - spent,
    }
}

/// Per-invoice income summary with grand totals and outstanding balance.
pub fn income_summary(invoices: &[Invoice]) -> IncomeSummary {
    let rows: Vec<IncomeSummaryRow> = invoices
        .iter()
        .map(|inv| IncomeSummaryRow {
            invoice_number: inv.invoice_number.clone(),
            customer_id: inv.customer_id.clone(),
            date: inv.invoice_date,
            total: inv.total(),
            paid: inv.paid_amount(),
            status: inv.status,
            currency_code: inv.currency_code.clone(),
        })
        .collect();

    let total: Money = rows.iter().map(|r| r.total).sum();
    let total_paid: Money = rows.iter().map(|r| r.paid).sum();

    IncomeSummary {
        rows,
        total,
        total_paid,
        outstanding: total - total_paid,
    }
}

/// Expense totals grouped by category, in the categories' given order.
/// Categories with nothing spent are dropped from the result.
pub fn category_breakdown(
    categories: &[ExpenseCategory],
    expenses: &[Expense],
) -> Vec<CategoryTotal> {
    categories
        .iter()
        .filter_map(|category| {
            let total: Money = expenses
                .iter()
                .filter(|e| e.category_id == category.id)
                .map(|e| e.amount())
                .sum();

            total.is_positive().then(|| CategoryTotal {
                name: category.name.clone(),
                color: category.color.clone(),
                total,
            })
        })
        .collect()
}

/// Buckets dated amounts by calendar month, ascending.
///
/// Months with no entries are absent rather than zero-filled, matching what
/// a sparse chart expects.
pub fn monthly_totals<I>(entries: I) -> Vec<MonthlyTotal>
where
    I: IntoIterator<Item = (DateTime<Utc>, Money)>,
{
    let mut buckets: BTreeMap<String, Money> = BTreeMap::new();

    for (date, amount) in entries {
        let key = format!("{:04}-{:02}", date.year(), date.month());
        *buckets.entry(key).or_insert_with(Money::zero) += amount;
    }

    buckets
        .into_iter()
        .map(|(month, total)| MonthlyTotal { month, total })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn invoice(
        number: &str,
        status: InvoiceStatus,
        total_cents: i64,
        paid_cents: i64,
        date: DateTime<Utc>,
    ) -> Invoice {
        Invoice {
            id: format!("id-{number}"),
            invoice_number: number.to_string(),
            customer_id: "customer-1".to_string(),
            currency_code: "USD".to_string(),
            invoice_date: date,
            due_date: date + chrono::Duration::days(30),
            status,
            subtotal_cents: total_cents,
            tax_cents: 0,
            discount_cents: 0,
            total_cents,
            paid_amount_cents: paid_cents,
            notes: None,
            terms: None,
            created_at: date,
            updated_at: date,
        }
    }

    fn expense(category_id: &str, amount_cents: i64, date: DateTime<Utc>) -> Expense {
        Expense {
            id: format!("exp-{category_id}-{amount_cents}"),
            category_id: category_id.to_string(),
            vendor_id: None,
            currency_code: "USD".to_string(),
            description: "Expense".to_string(),
            reference: None,
            amount_cents,
            expense_date: date,
            created_at: date,
        }
    }

    fn category(id: &str, name: &str) -> ExpenseCategory {
        ExpenseCategory {
            id: id.to_string(),
            name: name.to_string(),
            color: Some("#8884d8".to_string()),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_income_counts_only_collected_amounts() {
        let invoices = vec![
            invoice("INV-00001", InvoiceStatus::Paid, 100_000, 100_000, jan(5)),
            invoice("INV-00002", InvoiceStatus::Partial, 80_000, 30_000, jan(9)),
            // Sent but unpaid: contributes nothing
            invoice("INV-00003", InvoiceStatus::Sent, 50_000, 0, jan(12)),
            // Cancelled: contributes nothing
            invoice("INV-00004", InvoiceStatus::Cancelled, 20_000, 0, jan(15)),
        ];

        assert_eq!(income_total(&invoices).cents(), 130_000);
    }

    #[test]
    fn test_pending_summary() {
        let invoices = vec![
            invoice("INV-00001", InvoiceStatus::Draft, 10_000, 0, jan(1)),
            invoice("INV-00002", InvoiceStatus::Sent, 20_000, 0, jan(2)),
            invoice("INV-00003", InvoiceStatus::Approved, 30_000, 0, jan(3)),
            invoice("INV-00004", InvoiceStatus::Partial, 40_000, 10_000, jan(4)),
        ];

        let summary = pending_summary(&invoices);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total.cents(), 60_000);
    }

    #[test]
    fn test_profit_loss() {
        let invoices = vec![invoice(
            "INV-00001",
            InvoiceStatus::Paid,
            100_000,
            100_000,
            jan(5),
        )];
        let expenses = vec![expense("cat-rent", 40_000, jan(3))];

        let report = profit_loss(&invoices, &expenses);
        assert_eq!(report.income.cents(), 100_000);
        assert_eq!(report.expenses.cents(), 40_000);
        assert_eq!(report.profit.cents(), 60_000);
    }

    #[test]
    fn test_profit_loss_can_be_negative() {
        let expenses = vec![expense("cat-rent", 40_000, jan(3))];
        let report = profit_loss(&[], &expenses);
        assert_eq!(report.profit.cents(), -40_000);
    }

    #[test]
    fn test_income_summary_outstanding() {
        let invoices = vec![
            invoice("INV-00001", InvoiceStatus::Paid, 100_000, 100_000, jan(5)),
            invoice("INV-00002", InvoiceStatus::Partial, 80_000, 30_000, jan(9)),
        ];

        let summary = income_summary(&invoices);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.total.cents(), 180_000);
        assert_eq!(summary.total_paid.cents(), 130_000);
        assert_eq!(summary.outstanding.cents(), 50_000);
        assert_eq!(summary.rows[0].invoice_number, "INV-00001");
    }

    #[test]
    fn test_category_breakdown_drops_empty_categories() {
        let categories = vec![
            category("cat-rent", "Rent"),
            category("cat-travel", "Travel"),
            category("cat-office", "Office Supplies"),
        ];
        let expenses = vec![
            expense("cat-rent", 40_000, jan(3)),
            expense("cat-rent", 5_000, jan(20)),
            expense("cat-office", 1_200, jan(8)),
        ];

        let breakdown = category_breakdown(&categories, &expenses);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].name, "Rent");
        assert_eq!(breakdown[0].total.cents(), 45_000);
        assert_eq!(breakdown[1].name, "Office Supplies");
        assert_eq!(breakdown[1].total.cents(), 1_200);
    }

    #[test]
    fn test_monthly_totals_buckets_and_sorts() {
        let feb = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
        let dec = Utc.with_ymd_and_hms(2025, 12, 28, 0, 0, 0).unwrap();

        let series = monthly_totals(vec![
            (jan(5), Money::from_cents(100)),
            (feb, Money::from_cents(250)),
            (jan(20), Money::from_cents(50)),
            (dec, Money::from_cents(75)),
        ]);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].month, "2025-12");
        assert_eq!(series[0].total.cents(), 75);
        assert_eq!(series[1].month, "2026-01");
        assert_eq!(series[1].total.cents(), 150);
        assert_eq!(series[2].month, "2026-02");
        assert_eq!(series[2].total.cents(), 250);
    }
}
