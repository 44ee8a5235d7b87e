//! # Report Repository
//!
//! Dashboard and report assembly.
//!
//! ## Division of Labor
//! Queries here do nothing but fetch rows for a period; every number the
//! client sees is produced by the pure reducers in
//! `minibooks_core::reporting`, where the arithmetic is unit-tested without
//! a database.

use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::expense::ExpenseRepository;
use minibooks_core::reporting::{
    category_breakdown, expense_total, income_summary, income_total, monthly_totals,
    pending_summary, profit_loss, CategoryTotal, IncomeSummary, MonthlyTotal, PendingSummary,
};
use minibooks_core::{Expense, Invoice, Money};

/// Inclusive date range of a report.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Profit & loss report.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitLossReport {
    pub period: ReportPeriod,
    pub income: Money,
    pub expenses: Money,
    pub profit: Money,
    pub expenses_by_category: Vec<CategoryTotal>,
}

/// Income summary report.
#[derive(Debug, Clone, Serialize)]
pub struct IncomeSummaryReport {
    pub period: ReportPeriod,
    #[serde(flatten)]
    pub summary: IncomeSummary,
}

/// Expense summary report.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSummaryReport {
    pub period: ReportPeriod,
    pub expenses: Vec<Expense>,
    pub total: Money,
}

/// Everything the dashboard landing view shows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// Collected revenue, current month to date.
    pub income: Money,
    /// Expenses, current month to date.
    pub expenses: Money,
    /// income - expenses, current month to date.
    pub profit: Money,
    /// All invoices still awaiting payment, regardless of date.
    pub pending_invoices: PendingSummary,
    /// Up to 10 collectible invoices past their due date, due first.
    pub overdue_invoices: Vec<Invoice>,
    /// 5 most recently created invoices.
    pub recent_invoices: Vec<Invoice>,
    /// 5 most recently recorded expenses.
    pub recent_expenses: Vec<Expense>,
    /// Collected revenue per month, last six months.
    pub monthly_income: Vec<MonthlyTotal>,
    /// Expenses per month, last six months.
    pub monthly_expenses: Vec<MonthlyTotal>,
    /// Month-to-date expense totals per category.
    pub expenses_by_category: Vec<CategoryTotal>,
}

/// Repository assembling dashboard and report payloads.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Profit & loss over a period, with the per-category expense breakdown.
    pub async fn profit_loss(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<ProfitLossReport> {
        let invoices = self.invoices_between(start, end).await?;
        let expenses = self.expenses_between(start, end).await?;
        let categories = ExpenseRepository::new(self.pool.clone()).categories().await?;

        let totals = profit_loss(&invoices, &expenses);

        Ok(ProfitLossReport {
            period: ReportPeriod { start, end },
            income: totals.income,
            expenses: totals.expenses,
            profit: totals.profit,
            expenses_by_category: category_breakdown(&categories, &expenses),
        })
    }

    /// Per-invoice income summary over a period.
    pub async fn income_summary(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<IncomeSummaryReport> {
        let invoices = self.invoices_between(start, end).await?;

        Ok(IncomeSummaryReport {
            period: ReportPeriod { start, end },
            summary: income_summary(&invoices),
        })
    }

    /// Expense listing with total over a period.
    pub async fn expense_summary(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<ExpenseSummaryReport> {
        let expenses = self.expenses_between(start, end).await?;
        let total = expense_total(&expenses);

        Ok(ExpenseSummaryReport {
            period: ReportPeriod { start, end },
            expenses,
            total,
        })
    }

    /// Assembles the dashboard landing view.
    pub async fn dashboard_stats(&self, now: DateTime<Utc>) -> DbResult<DashboardStats> {
        debug!(now = %now, "Assembling dashboard stats");

        // UTC has no ambiguous local times; the fallback is unreachable.
        let month_start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now);
        let six_months_ago = now.checked_sub_months(Months::new(6)).unwrap_or(month_start);

        let month_invoices = self.invoices_between(month_start, now).await?;
        let month_expenses = self.expenses_between(month_start, now).await?;
        let window_invoices = self.invoices_between(six_months_ago, now).await?;
        let window_expenses = self.expenses_between(six_months_ago, now).await?;
        let categories = ExpenseRepository::new(self.pool.clone()).categories().await?;

        let income = income_total(&month_invoices);
        let expenses = expense_total(&month_expenses);

        Ok(DashboardStats {
            income,
            expenses,
            profit: income - expenses,
            pending_invoices: pending_summary(&self.pending_invoices().await?),
            overdue_invoices: self.overdue_invoices(now, 10).await?,
            recent_invoices: self.recent_invoices(5).await?,
            recent_expenses: self.recent_expenses(5).await?,
            monthly_income: monthly_totals(
                window_invoices
                    .iter()
                    .filter(|inv| inv.status.counts_as_income())
                    .map(|inv| (inv.invoice_date, inv.paid_amount())),
            ),
            monthly_expenses: monthly_totals(
                window_expenses.iter().map(|e| (e.expense_date, e.amount())),
            ),
            expenses_by_category: category_breakdown(&categories, &month_expenses),
        })
    }

    // -------------------------------------------------------------------------
    // Fetch helpers
    // -------------------------------------------------------------------------

    async fn invoices_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, customer_id, currency_code,
                invoice_date, due_date, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_amount_cents, notes, terms, created_at, updated_at
            FROM invoices
            WHERE invoice_date >= ?1 AND invoice_date <= ?2
            ORDER BY invoice_date DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn expenses_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Expense>> {
        ExpenseRepository::new(self.pool.clone())
            .list_between(start, end)
            .await
    }

    async fn pending_invoices(&self) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, customer_id, currency_code,
                invoice_date, due_date, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_amount_cents, notes, terms, created_at, updated_at
            FROM invoices
            WHERE status IN ('DRAFT', 'SENT', 'VIEWED', 'APPROVED')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn overdue_invoices(&self, now: DateTime<Utc>, limit: i64) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, customer_id, currency_code,
                invoice_date, due_date, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_amount_cents, notes, terms, created_at, updated_at
            FROM invoices
            WHERE due_date < ?1 AND status NOT IN ('PAID', 'CANCELLED')
            ORDER BY due_date ASC
            LIMIT ?2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn recent_invoices(&self, limit: i64) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, customer_id, currency_code,
                invoice_date, due_date, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_amount_cents, notes, terms, created_at, updated_at
            FROM invoices
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn recent_expenses(&self, limit: i64) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT
                id, category_id, vendor_id, currency_code,
                description, reference, amount_cents, expense_date, created_at
            FROM expenses
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
