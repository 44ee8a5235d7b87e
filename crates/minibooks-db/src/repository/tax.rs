//! # Tax Repository
//!
//! Storage for named tax rates and the lookup table handed to the totals
//! computation.
//!
//! The rate table of a small business is tiny (a handful of VAT/GST rows),
//! so the lookup preloads the whole table into memory once per computation
//! instead of querying per line item.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minibooks_core::invoice::{LineInput, TaxRateLookup};
use minibooks_core::validation::validate_tax_rate_bps;
use minibooks_core::{Tax, TaxRate};

/// Repository for tax rate operations.
#[derive(Debug, Clone)]
pub struct TaxRepository {
    pool: SqlitePool,
}

impl TaxRepository {
    /// Creates a new TaxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TaxRepository { pool }
    }

    /// Inserts a new tax rate.
    ///
    /// ## Errors
    /// - Rate outside 0..=10000 bps
    pub async fn insert(&self, name: &str, rate_bps: u32) -> DbResult<Tax> {
        validate_tax_rate_bps(rate_bps).map_err(minibooks_core::CoreError::from)?;

        let now = Utc::now();
        let tax = Tax {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            rate_bps,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %tax.id, name = %tax.name, rate_bps, "Inserting tax rate");

        sqlx::query(
            r#"
            INSERT INTO taxes (id, name, rate_bps, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&tax.id)
        .bind(&tax.name)
        .bind(tax.rate_bps)
        .bind(tax.created_at)
        .bind(tax.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(tax)
    }

    /// Gets a tax rate by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Tax>> {
        let tax = sqlx::query_as::<_, Tax>(
            r#"
            SELECT id, name, rate_bps, created_at, updated_at
            FROM taxes
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tax)
    }

    /// Gets all tax rates, newest first.
    pub async fn all(&self) -> DbResult<Vec<Tax>> {
        let taxes = sqlx::query_as::<_, Tax>(
            r#"
            SELECT id, name, rate_bps, created_at, updated_at
            FROM taxes
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(taxes)
    }

    /// Deletes a tax rate.
    ///
    /// Line items referencing it keep their `tax_rate_id`; the dangling
    /// reference simply resolves to zero tax on future recomputation.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM taxes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tax", id));
        }

        Ok(())
    }

    /// Loads the full rate table for use during totals computation.
    pub async fn lookup(&self) -> DbResult<TaxRateTable> {
        let rows: Vec<(String, u32)> = sqlx::query_as("SELECT id, rate_bps FROM taxes")
            .fetch_all(&self.pool)
            .await?;

        Ok(TaxRateTable {
            rates: rows
                .into_iter()
                .map(|(id, bps)| (id, TaxRate::from_bps(bps)))
                .collect(),
        })
    }
}

// =============================================================================
// Lookup Table
// =============================================================================

/// A preloaded tax rate table implementing the computation lookup seam.
#[derive(Debug, Clone, Default)]
pub struct TaxRateTable {
    rates: HashMap<String, TaxRate>,
}

impl TaxRateTable {
    /// Number of rates in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Logs a data-quality warning for every line whose tax rate reference
    /// doesn't resolve. Unknown references still compute as untaxed; this
    /// keeps the signal from disappearing silently.
    pub fn warn_unknown_rates(&self, lines: &[LineInput]) {
        for line in lines {
            if let Some(id) = line.tax_rate_id.as_deref() {
                if self.rate(id).is_none() {
                    warn!(
                        tax_rate_id = %id,
                        line = %line.name,
                        "Unknown tax rate on line item; treating as untaxed"
                    );
                }
            }
        }
    }
}

impl TaxRateLookup for TaxRateTable {
    fn rate(&self, tax_rate_id: &str) -> Option<TaxRate> {
        self.rates.get(tax_rate_id).copied()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;

        let vat = db.taxes().insert("VAT 14%", 1400).await.unwrap();
        let fetched = db.taxes().get_by_id(&vat.id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "VAT 14%");
        assert_eq!(fetched.rate_bps, 1400);
        assert_eq!(fetched.rate(), TaxRate::from_bps(1400));
    }

    #[tokio::test]
    async fn test_invalid_rate_rejected() {
        let db = test_db().await;
        let err = db.taxes().insert("Broken", 10_001).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_lookup_table() {
        let db = test_db().await;
        let vat = db.taxes().insert("VAT 14%", 1400).await.unwrap();
        db.taxes().insert("GST 5%", 500).await.unwrap();

        let table = db.taxes().lookup().await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rate(&vat.id), Some(TaxRate::from_bps(1400)));
        assert_eq!(table.rate("no-such-rate"), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let vat = db.taxes().insert("VAT 14%", 1400).await.unwrap();

        db.taxes().delete(&vat.id).await.unwrap();
        assert!(db.taxes().get_by_id(&vat.id).await.unwrap().is_none());

        let err = db.taxes().delete(&vat.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
