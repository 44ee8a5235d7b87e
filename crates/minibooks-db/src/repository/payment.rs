//! # Payment Repository
//!
//! Atomic payment application against invoices.
//!
//! ## The Lost-Update Hazard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WITHOUT a transaction + guard:                                         │
//! │                                                                         │
//! │  Payment A ($300)              Payment B ($400)                        │
//! │  ──────────────────            ──────────────────                      │
//! │  read paid = 0                                                         │
//! │                                read paid = 0                           │
//! │  write paid = 300                                                      │
//! │                                write paid = 400   ← A's effect GONE    │
//! │                                                                         │
//! │  WITH this repository:                                                  │
//! │                                                                         │
//! │  Both payments run read → compute → insert → UPDATE .. WHERE           │
//! │  paid_amount_cents = <value read> inside one transaction. The loser    │
//! │  of the race updates zero rows, rolls back, and retries with a fresh   │
//! │  read. Final state: paid = 700, both payment rows present.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The status math itself lives in `minibooks_core::payment::apply_payment`;
//! this module only wraps it in the transaction it needs to be correct.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minibooks_core::payment::{apply_payment, InvoiceBalance, PaymentOutcome};
use minibooks_core::validation::validate_uuid;
use minibooks_core::{CoreError, Invoice, InvoiceStatus, Money, Payment, PaymentMethod};

/// How many times a conflicted payment transaction is retried with a fresh
/// read before the conflict is surfaced to the caller.
const MAX_ATTEMPTS: u32 = 3;

/// Everything needed to record a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub invoice_id: String,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// The result of recording a payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    /// Invoice paid-to-date after this payment.
    pub paid_amount: Money,
    /// Invoice status after this payment.
    pub status: InvoiceStatus,
    /// Amount beyond the invoice total, zero in the normal case.
    pub overpayment: Money,
}

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Records a payment and updates the invoice's paid amount and status
    /// as one atomic unit.
    ///
    /// ## Errors
    /// - Unknown invoice → `NotFound` (hard failure, never retried)
    /// - Non-positive amount, PAID/CANCELLED invoice → `Domain` (from the
    ///   core transition, never retried)
    /// - Sustained write conflicts → `Conflict` after bounded retries
    pub async fn record(&self, new: &NewPayment) -> DbResult<PaymentReceipt> {
        validate_uuid(&new.invoice_id).map_err(CoreError::from)?;

        let mut attempt = 1;
        loop {
            match self.try_record(new).await {
                Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                    debug!(
                        invoice_id = %new.invoice_id,
                        attempt,
                        "Payment transaction conflicted; retrying with fresh read"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// One attempt at the payment transaction.
    async fn try_record(&self, new: &NewPayment) -> DbResult<PaymentReceipt> {
        let mut tx = self.pool.begin().await?;

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
        .bind(&new.invoice_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", &new.invoice_id))?;

        // Pure transition; rejects terminal states and bad amounts.
        let outcome: PaymentOutcome = apply_payment(&InvoiceBalance::from(&invoice), new.amount)?;

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            invoice_id: new.invoice_id.clone(),
            amount_cents: new.amount.cents(),
            payment_date: new.payment_date,
            method: new.method,
            reference: new.reference.clone(),
            notes: new.notes.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, invoice_id, amount_cents, payment_date,
                method, reference, notes, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8
            )
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.invoice_id)
        .bind(payment.amount_cents)
        .bind(payment.payment_date)
        .bind(payment.method)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        // Compare-and-swap on the paid amount we read: if a concurrent
        // payment got in first, zero rows match and this attempt rolls back.
        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                paid_amount_cents = ?2,
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND paid_amount_cents = ?5
            "#,
        )
        .bind(&new.invoice_id)
        .bind(outcome.paid_amount.cents())
        .bind(outcome.status)
        .bind(Utc::now())
        .bind(invoice.paid_amount_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Invoice", &new.invoice_id));
        }

        tx.commit().await?;

        if outcome.overpayment.is_positive() {
            warn!(
                invoice_id = %new.invoice_id,
                overpayment = %outcome.overpayment,
                "Invoice overpaid; no refund mechanism exists"
            );
        }

        info!(
            invoice_id = %new.invoice_id,
            payment_id = %payment.id,
            amount = %new.amount,
            paid_amount = %outcome.paid_amount,
            status = ?outcome.status,
            "Payment recorded"
        );

        Ok(PaymentReceipt {
            payment,
            paid_amount: outcome.paid_amount,
            status: outcome.status,
            overpayment: outcome.overpayment,
        })
    }

    /// Gets all payments for an invoice, newest payment date first.
    pub async fn list_for_invoice(&self, invoice_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT
                id, invoice_id, amount_cents, payment_date,
                method, reference, notes, created_at
            FROM payments
            WHERE invoice_id = ?1
            ORDER BY payment_date DESC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Total amount recorded against an invoice.
    ///
    /// Diagnostic query; the authoritative paid-to-date lives on the invoice
    /// row and the two always match because both are written in the same
    /// transaction.
    pub async fn total_recorded(&self, invoice_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(amount_cents) FROM payments WHERE invoice_id = ?1")
                .bind(invoice_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::invoice::NewInvoice;
    use minibooks_core::invoice::LineInput;
    use minibooks_core::types::Quantity;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Creates an invoice totalling the given cents (one untaxed line).
    async fn invoice_totalling(db: &Database, total_cents: i64) -> Invoice {
        let now = Utc::now();
        db.invoices()
            .create(&NewInvoice {
                customer_id: "customer-1".to_string(),
                currency_code: "USD".to_string(),
                invoice_date: now,
                due_date: now + chrono::Duration::days(30),
                lines: vec![LineInput {
                    name: "Work".to_string(),
                    description: None,
                    quantity: Quantity::from_units(1),
                    unit_price: Money::from_cents(total_cents),
                    tax_rate_id: None,
                }],
                discount: Money::zero(),
                notes: None,
                terms: None,
            })
            .await
            .unwrap()
    }

    fn payment(invoice_id: &str, cents: i64) -> NewPayment {
        NewPayment {
            invoice_id: invoice_id.to_string(),
            amount: Money::from_cents(cents),
            payment_date: Utc::now(),
            method: PaymentMethod::BankTransfer,
            reference: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_full_payment_marks_paid() {
        let db = test_db().await;
        let invoice = invoice_totalling(&db, 1000).await;

        let receipt = db.payments().record(&payment(&invoice.id, 1000)).await.unwrap();

        assert_eq!(receipt.paid_amount.cents(), 1000);
        assert_eq!(receipt.status, InvoiceStatus::Paid);
        assert!(receipt.overpayment.is_zero());

        let stored = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.paid_amount_cents, 1000);
        assert_eq!(stored.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_partial_payment_marks_partial() {
        let db = test_db().await;
        let invoice = invoice_totalling(&db, 1000).await;

        let receipt = db.payments().record(&payment(&invoice.id, 400)).await.unwrap();

        assert_eq!(receipt.paid_amount.cents(), 400);
        assert_eq!(receipt.status, InvoiceStatus::Partial);

        let stored = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Partial);
        assert_eq!(stored.paid_amount_cents, 400);
    }

    #[tokio::test]
    async fn test_sequential_payments_accumulate() {
        let db = test_db().await;
        let invoice = invoice_totalling(&db, 1000).await;

        db.payments().record(&payment(&invoice.id, 300)).await.unwrap();
        let receipt = db.payments().record(&payment(&invoice.id, 700)).await.unwrap();

        assert_eq!(receipt.paid_amount.cents(), 1000);
        assert_eq!(receipt.status, InvoiceStatus::Paid);
        assert_eq!(db.payments().total_recorded(&invoice.id).await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_unknown_invoice_is_hard_failure() {
        let db = test_db().await;
        let err = db
            .payments()
            .record(&payment("3b9f2a64-3e27-4a6e-9a54-6a2a7c9d1f00", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_invoice_id_rejected() {
        let db = test_db().await;
        let err = db.payments().record(&payment("not-a-uuid", 100)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_payment_against_terminal_invoice_rejected() {
        let db = test_db().await;
        let invoice = invoice_totalling(&db, 1000).await;
        db.payments().record(&payment(&invoice.id, 1000)).await.unwrap();

        // Now PAID: further payments refused, nothing written.
        let err = db.payments().record(&payment(&invoice.id, 100)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvoiceClosed { .. })));
        assert_eq!(db.payments().total_recorded(&invoice.id).await.unwrap(), 1000);

        let cancelled = invoice_totalling(&db, 500).await;
        db.invoices()
            .set_status(&cancelled.id, InvoiceStatus::Cancelled)
            .await
            .unwrap();
        let err = db.payments().record(&payment(&cancelled.id, 100)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvoiceClosed { .. })));
    }

    #[tokio::test]
    async fn test_overpayment_recorded_and_flagged() {
        let db = test_db().await;
        let invoice = invoice_totalling(&db, 1000).await;

        let receipt = db.payments().record(&payment(&invoice.id, 1400)).await.unwrap();

        assert_eq!(receipt.status, InvoiceStatus::Paid);
        assert_eq!(receipt.overpayment.cents(), 400);

        let stored = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.paid_amount_cents, 1400);
    }

    #[tokio::test]
    async fn test_list_for_invoice() {
        let db = test_db().await;
        let invoice = invoice_totalling(&db, 1000).await;

        db.payments().record(&payment(&invoice.id, 300)).await.unwrap();
        db.payments().record(&payment(&invoice.id, 200)).await.unwrap();

        let payments = db.payments().list_for_invoice(&invoice.id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert!(payments.iter().all(|p| p.invoice_id == invoice.id));
    }

    #[tokio::test]
    async fn test_concurrent_payments_never_lose_an_update() {
        // File-backed database so the two transactions genuinely race.
        let path = std::env::temp_dir().join(format!("minibooks-pay-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(5))
            .await
            .unwrap();
        let invoice = invoice_totalling(&db, 1000).await;

        let (a, b) = tokio::join!(
            {
                let db = db.clone();
                let id = invoice.id.clone();
                async move { db.payments().record(&payment(&id, 300)).await }
            },
            {
                let db = db.clone();
                let id = invoice.id.clone();
                async move { db.payments().record(&payment(&id, 400)).await }
            }
        );
        a.unwrap();
        b.unwrap();

        let stored = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.paid_amount_cents, 700, "a payment was lost");
        assert_eq!(stored.status, InvoiceStatus::Partial);
        assert_eq!(db.payments().total_recorded(&invoice.id).await.unwrap(), 700);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
