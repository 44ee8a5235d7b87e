//! # Invoice Repository
//!
//! Database operations for invoices and their line items.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Invoice Lifecycle                                  │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → one transaction:                                    │
//! │         ├── counter +1 → invoice number (INV-00042)                    │
//! │         ├── totals computed in minibooks-core                          │
//! │         └── invoice + line items inserted                              │
//! │                                                                         │
//! │  2. EDIT                                                               │
//! │     └── replace_lines() → prior line set superseded, totals            │
//! │         recomputed, all in one transaction                             │
//! │                                                                         │
//! │  3. LIFECYCLE UPDATES                                                  │
//! │     └── set_status() → SENT / VIEWED / APPROVED / CANCELLED            │
//! │         (PARTIAL and PAID are payment-driven and refused here)         │
//! │                                                                         │
//! │  4. PAYMENTS                                                           │
//! │     └── see PaymentRepository - updates paid_amount and status         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why the Counter Lives in the Transaction
//! Deriving the next invoice number from a row count lets two simultaneous
//! creations read the same count and mint the same number. The `counters`
//! upsert is a write, so SQLite serializes it against every other creation;
//! by the time `RETURNING value` yields, the value is this transaction's
//! alone. Rolling back also rolls back the increment - numbers stay gapless
//! unless a crash interleaves, which is acceptable.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::tax::TaxRepository;
use minibooks_core::error::ValidationError;
use minibooks_core::invoice::{aggregate_totals, compute_line_amounts, LineAmounts, LineInput};
use minibooks_core::numbering::format_invoice_number;
use minibooks_core::payment::validate_explicit_status;
use minibooks_core::{CoreError, Invoice, InvoiceItem, InvoiceStatus, Money};

/// Name of the counters row backing the invoice number sequence.
const INVOICE_NUMBER_COUNTER: &str = "invoice_number";

/// Everything needed to create an invoice.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_id: String,
    /// ISO 4217 code of the invoice currency.
    pub currency_code: String,
    pub invoice_date: chrono::DateTime<Utc>,
    pub due_date: chrono::DateTime<Utc>,
    pub lines: Vec<LineInput>,
    pub discount: Money,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

/// Filters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    /// Substring match on invoice number or customer reference.
    pub search: Option<String>,
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates an invoice with computed totals and a fresh sequential number.
    ///
    /// ## What Happens
    /// 1. Line amounts and totals are computed (pure, validated)
    /// 2. One transaction: counter increment → number, invoice insert,
    ///    line item inserts
    ///
    /// The invoice starts in DRAFT with nothing paid.
    pub async fn create(&self, new: &NewInvoice) -> DbResult<Invoice> {
        if new.customer_id.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "customer_id".to_string(),
            })
            .into());
        }

        let (items, totals) = self.compute(&new.lines, new.discount).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Atomic increment-and-read; see module docs.
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO counters (name, value) VALUES (?1, 1)
            ON CONFLICT (name) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(INVOICE_NUMBER_COUNTER)
        .fetch_one(&mut *tx)
        .await?;

        let invoice = Invoice {
            id: id.clone(),
            invoice_number: format_invoice_number(seq),
            customer_id: new.customer_id.clone(),
            currency_code: new.currency_code.clone(),
            invoice_date: new.invoice_date,
            due_date: new.due_date,
            status: InvoiceStatus::Draft,
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax_amount.cents(),
            discount_cents: totals.discount_amount.cents(),
            total_cents: totals.total.cents(),
            paid_amount_cents: 0,
            notes: new.notes.clone(),
            terms: new.terms.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %invoice.id, invoice_number = %invoice.invoice_number, "Inserting invoice");

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, customer_id, currency_code,
                invoice_date, due_date, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_amount_cents, notes, terms, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_id)
        .bind(&invoice.currency_code)
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(invoice.status)
        .bind(invoice.subtotal_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.discount_cents)
        .bind(invoice.total_cents)
        .bind(invoice.paid_amount_cents)
        .bind(&invoice.notes)
        .bind(&invoice.terms)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &invoice.id, &new.lines, &items).await?;

        tx.commit().await?;

        info!(
            id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total = %totals.total,
            lines = new.lines.len(),
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, customer_id, currency_code,
                invoice_date, due_date, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_amount_cents, notes, terms, created_at, updated_at
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Gets all line items for an invoice, in insertion order.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT
                id, invoice_id, name, description,
                quantity_milli, unit_price_cents, tax_rate_id,
                line_total_cents, tax_cents, created_at
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists invoices, newest invoice date first.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
        let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, customer_id, currency_code,
                invoice_date, due_date, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_amount_cents, notes, terms, created_at, updated_at
            FROM invoices
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR invoice_number LIKE ?2 OR customer_id LIKE ?2)
            ORDER BY invoice_date DESC
            "#,
        )
        .bind(filter.status)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Replaces an invoice's line set and recomputes its totals.
    ///
    /// ## Supersede Semantics
    /// The prior line items are discarded, never mutated; the submitted
    /// payload is computed from scratch exactly as at creation time.
    /// `paid_amount` and `status` are untouched.
    pub async fn replace_lines(
        &self,
        id: &str,
        lines: &[LineInput],
        discount: Money,
    ) -> DbResult<Invoice> {
        let (items, totals) = self.compute(lines, discount).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, customer_id, currency_code,
                invoice_date, due_date, status,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                paid_amount_cents, notes, terms, created_at, updated_at
            FROM invoices
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", id))?;

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_items(&mut tx, id, lines, &items).await?;

        sqlx::query(
            r#"
            UPDATE invoices SET
                subtotal_cents = ?2,
                tax_cents = ?3,
                discount_cents = ?4,
                total_cents = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(totals.subtotal.cents())
        .bind(totals.tax_amount.cents())
        .bind(totals.discount_amount.cents())
        .bind(totals.total.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = %id, total = %totals.total, lines = lines.len(), "Invoice lines replaced");

        invoice.subtotal_cents = totals.subtotal.cents();
        invoice.tax_cents = totals.tax_amount.cents();
        invoice.discount_cents = totals.discount_amount.cents();
        invoice.total_cents = totals.total.cents();
        invoice.updated_at = now;

        Ok(invoice)
    }

    /// Applies an explicit lifecycle status update.
    ///
    /// ## Errors
    /// - PARTIAL/PAID targets are refused; those states are derived from
    ///   payments only
    /// - Unknown invoice → NotFound
    pub async fn set_status(&self, id: &str, status: InvoiceStatus) -> DbResult<()> {
        validate_explicit_status(status)?;

        let result = sqlx::query(
            r#"
            UPDATE invoices SET status = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        info!(id = %id, status = ?status, "Invoice status updated");

        Ok(())
    }

    /// Deletes an invoice. Line items and payments cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        info!(id = %id, "Invoice deleted");

        Ok(())
    }

    /// Runs the pure totals computation against the current rate table.
    async fn compute(
        &self,
        lines: &[LineInput],
        discount: Money,
    ) -> DbResult<(Vec<LineAmounts>, minibooks_core::InvoiceTotals)> {
        let rates = TaxRepository::new(self.pool.clone()).lookup().await?;
        rates.warn_unknown_rates(lines);

        let amounts = lines
            .iter()
            .map(|line| compute_line_amounts(line, &rates))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)?;

        let totals = aggregate_totals(&amounts, discount).map_err(DbError::from)?;

        Ok((amounts, totals))
    }
}

/// Inserts computed line items for an invoice inside the given transaction.
async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    invoice_id: &str,
    lines: &[LineInput],
    amounts: &[LineAmounts],
) -> DbResult<()> {
    let now = Utc::now();

    for (line, amount) in lines.iter().zip(amounts) {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, name, description,
                quantity_milli, unit_price_cents, tax_rate_id,
                line_total_cents, tax_cents, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10
            )
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(invoice_id)
        .bind(&line.name)
        .bind(&line.description)
        .bind(line.quantity.milli())
        .bind(line.unit_price.cents())
        .bind(&line.tax_rate_id)
        .bind(amount.line_total.cents())
        .bind(amount.line_tax.cents())
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use minibooks_core::types::Quantity;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn line(name: &str, qty_milli: i64, price_cents: i64, tax: Option<&str>) -> LineInput {
        LineInput {
            name: name.to_string(),
            description: None,
            quantity: Quantity::from_milli(qty_milli),
            unit_price: Money::from_cents(price_cents),
            tax_rate_id: tax.map(str::to_string),
        }
    }

    fn new_invoice(lines: Vec<LineInput>, discount_cents: i64) -> NewInvoice {
        let now = Utc::now();
        NewInvoice {
            customer_id: "customer-1".to_string(),
            currency_code: "USD".to_string(),
            invoice_date: now,
            due_date: now + chrono::Duration::days(30),
            lines,
            discount: Money::from_cents(discount_cents),
            notes: None,
            terms: Some("Net 30".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_computes_totals_and_number() {
        let db = test_db().await;
        let vat = db.taxes().insert("VAT 14%", 1400).await.unwrap();

        let invoice = db
            .invoices()
            .create(&new_invoice(
                vec![line("Consulting", 2000, 10_000, Some(&vat.id))],
                0,
            ))
            .await
            .unwrap();

        assert_eq!(invoice.invoice_number, "INV-00001");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.subtotal_cents, 20_000);
        assert_eq!(invoice.tax_cents, 2_800);
        assert_eq!(invoice.total_cents, 22_800);
        assert_eq!(invoice.paid_amount_cents, 0);

        let items = db.invoices().get_items(&invoice.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line_total_cents, 20_000);
        assert_eq!(items[0].tax_cents, 2_800);
        assert_eq!(items[0].quantity(), Quantity::from_units(2));
    }

    #[tokio::test]
    async fn test_numbers_are_sequential() {
        let db = test_db().await;

        for expected in ["INV-00001", "INV-00002", "INV-00003"] {
            let invoice = db
                .invoices()
                .create(&new_invoice(vec![line("Item", 1000, 100, None)], 0))
                .await
                .unwrap();
            assert_eq!(invoice.invoice_number, expected);
        }
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let db = test_db().await;

        // No lines
        let err = db.invoices().create(&new_invoice(vec![], 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));

        // Discount beyond gross
        let err = db
            .invoices()
            .create(&new_invoice(vec![line("Item", 1000, 100, None)], 500))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::DiscountExceedsTotal { .. })
        ));

        // Missing customer
        let mut missing = new_invoice(vec![line("Item", 1000, 100, None)], 0);
        missing.customer_id = "  ".to_string();
        let err = db.invoices().create(&missing).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_unknown_tax_rate_computes_untaxed() {
        let db = test_db().await;

        let invoice = db
            .invoices()
            .create(&new_invoice(
                vec![line("Item", 1000, 50_000, Some("deleted-rate"))],
                0,
            ))
            .await
            .unwrap();

        assert_eq!(invoice.subtotal_cents, 50_000);
        assert_eq!(invoice.tax_cents, 0);
        assert_eq!(invoice.total_cents, 50_000);
    }

    #[tokio::test]
    async fn test_replace_lines_supersedes() {
        let db = test_db().await;
        let vat = db.taxes().insert("VAT 14%", 1400).await.unwrap();

        let invoice = db
            .invoices()
            .create(&new_invoice(vec![line("Old line", 1000, 10_000, None)], 0))
            .await
            .unwrap();

        let updated = db
            .invoices()
            .replace_lines(
                &invoice.id,
                &[
                    line("New line A", 2000, 10_000, Some(&vat.id)),
                    line("New line B", 1000, 5_000, None),
                ],
                Money::from_cents(800),
            )
            .await
            .unwrap();

        assert_eq!(updated.subtotal_cents, 25_000);
        assert_eq!(updated.tax_cents, 2_800);
        assert_eq!(updated.discount_cents, 800);
        assert_eq!(updated.total_cents, 27_000);
        // Number and payment state survive the edit
        assert_eq!(updated.invoice_number, invoice.invoice_number);
        assert_eq!(updated.paid_amount_cents, 0);

        let items = db.invoices().get_items(&invoice.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "New line A");
    }

    #[tokio::test]
    async fn test_replace_lines_missing_invoice() {
        let db = test_db().await;
        let err = db
            .invoices()
            .replace_lines("no-such-id", &[line("X", 1000, 100, None)], Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;

        let a = db
            .invoices()
            .create(&new_invoice(vec![line("Item", 1000, 100, None)], 0))
            .await
            .unwrap();
        let b = db
            .invoices()
            .create(&new_invoice(vec![line("Item", 1000, 100, None)], 0))
            .await
            .unwrap();
        db.invoices().set_status(&b.id, InvoiceStatus::Sent).await.unwrap();

        let all = db.invoices().list(&InvoiceFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let sent = db
            .invoices()
            .list(&InvoiceFilter {
                status: Some(InvoiceStatus::Sent),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, b.id);

        let by_number = db
            .invoices()
            .list(&InvoiceFilter {
                status: None,
                search: Some(a.invoice_number.clone()),
            })
            .await
            .unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].id, a.id);
    }

    #[tokio::test]
    async fn test_set_status_refuses_payment_driven_states() {
        let db = test_db().await;
        let invoice = db
            .invoices()
            .create(&new_invoice(vec![line("Item", 1000, 100, None)], 0))
            .await
            .unwrap();

        for status in [InvoiceStatus::Partial, InvoiceStatus::Paid] {
            let err = db.invoices().set_status(&invoice.id, status).await.unwrap_err();
            assert!(matches!(
                err,
                DbError::Domain(CoreError::StatusNotAssignable { .. })
            ));
        }

        db.invoices()
            .set_status(&invoice.id, InvoiceStatus::Cancelled)
            .await
            .unwrap();
        let fetched = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, InvoiceStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_delete_cascades_items() {
        let db = test_db().await;
        let invoice = db
            .invoices()
            .create(&new_invoice(vec![line("Item", 1000, 100, None)], 0))
            .await
            .unwrap();

        db.invoices().delete(&invoice.id).await.unwrap();

        assert!(db.invoices().get_by_id(&invoice.id).await.unwrap().is_none());
        assert!(db.invoices().get_items(&invoice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creations_get_distinct_numbers() {
        // File-backed database so tasks genuinely contend on the writer lock.
        let path = std::env::temp_dir().join(format!("minibooks-seq-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(5))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.invoices()
                    .create(&new_invoice(vec![line("Item", 1000, 100, None)], 0))
                    .await
                    .unwrap()
                    .invoice_number
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }

        let mut deduped = numbers.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 8, "duplicate invoice numbers: {numbers:?}");

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
