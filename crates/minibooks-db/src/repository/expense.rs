//! # Expense Repository
//!
//! Expenses and their categories. The shape here is deliberately narrow:
//! just enough write and period-query surface to feed the reports.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minibooks_core::error::ValidationError;
use minibooks_core::{CoreError, Expense, ExpenseCategory, Money};

/// Everything needed to record an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub category_id: String,
    pub vendor_id: Option<String>,
    pub currency_code: String,
    pub description: String,
    pub reference: Option<String>,
    pub amount: Money,
    pub expense_date: DateTime<Utc>,
}

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts a new expense category.
    pub async fn insert_category(
        &self,
        name: &str,
        color: Option<&str>,
    ) -> DbResult<ExpenseCategory> {
        let category = ExpenseCategory {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: color.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(id = %category.id, name = %category.name, "Inserting expense category");

        sqlx::query(
            r#"
            INSERT INTO expense_categories (id, name, color, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.color)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Gets all expense categories, alphabetically.
    pub async fn categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as::<_, ExpenseCategory>(
            r#"
            SELECT id, name, color, created_at
            FROM expense_categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Records an expense.
    ///
    /// ## Errors
    /// - Non-positive amount or empty description → validation error
    /// - Unknown category → foreign key violation
    pub async fn insert(&self, new: &NewExpense) -> DbResult<Expense> {
        if !new.amount.is_positive() {
            return Err(CoreError::from(ValidationError::MustBePositive {
                field: "amount".to_string(),
            })
            .into());
        }
        if new.description.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "description".to_string(),
            })
            .into());
        }

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            category_id: new.category_id.clone(),
            vendor_id: new.vendor_id.clone(),
            currency_code: new.currency_code.clone(),
            description: new.description.clone(),
            reference: new.reference.clone(),
            amount_cents: new.amount.cents(),
            expense_date: new.expense_date,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, category_id, vendor_id, currency_code,
                description, reference, amount_cents, expense_date, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9
            )
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.category_id)
        .bind(&expense.vendor_id)
        .bind(&expense.currency_code)
        .bind(&expense.description)
        .bind(&expense.reference)
        .bind(expense.amount_cents)
        .bind(expense.expense_date)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %expense.id, amount = %new.amount, "Expense recorded");

        Ok(expense)
    }

    /// Lists expenses dated within `[start, end]`, newest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT
                id, category_id, vendor_id, currency_code,
                description, reference, amount_cents, expense_date, created_at
            FROM expenses
            WHERE expense_date >= ?1 AND expense_date <= ?2
            ORDER BY expense_date DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Lists expenses in a category, newest first.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT
                id, category_id, vendor_id, currency_code,
                description, reference, amount_cents, expense_date, created_at
            FROM expenses
            WHERE category_id = ?1
            ORDER BY expense_date DESC
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Deletes an expense.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
