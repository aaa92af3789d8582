use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::expense::Expense;
use crate::models::pagination::Pagination;
use crate::models::summary::CategorySpending;

/// Trait defining expense repository operations
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Create a new expense
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Find an expense by ID, regardless of owner
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError>;

    /// List a user's expenses, newest first
    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Expense>, RepositoryError>;

    /// List all expenses of a category, newest first
    async fn list_by_category(&self, category_id: Uuid) -> Result<Vec<Expense>, RepositoryError>;

    /// Persist changed expense fields
    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError>;

    /// Delete an expense by ID
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Sum amounts per category for a user, including empty categories
    async fn spending_by_category(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CategorySpending>, RepositoryError>;
}

/// PostgreSQL implementation of ExpenseRepository
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let created = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (
                id, user_id, category_id, name, amount,
                description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, category_id, name, amount,
                      description, created_at, updated_at
            "#,
        )
        .bind(expense.id)
        .bind(expense.user_id)
        .bind(expense.category_id)
        .bind(&expense.name)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category_id, name, amount,
                   description, created_at, updated_at
            FROM expenses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category_id, name, amount,
                   description, created_at, updated_at
            FROM expenses
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    async fn list_by_category(&self, category_id: Uuid) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, category_id, name, amount,
                   description, created_at, updated_at
            FROM expenses
            WHERE category_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let updated = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses
            SET category_id = $2,
                name = $3,
                amount = $4,
                description = $5,
                updated_at = $6
            WHERE id = $1
            RETURNING id, user_id, category_id, name, amount,
                      description, created_at, updated_at
            "#,
        )
        .bind(expense.id)
        .bind(expense.category_id)
        .bind(&expense.name)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn spending_by_category(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CategorySpending>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategorySpending>(
            r#"
            SELECT c.id AS category_id,
                   c.name,
                   c.tag,
                   COALESCE(SUM(e.amount), 0) AS total,
                   COUNT(e.id) AS expense_count
            FROM categories c
            LEFT JOIN expenses e ON e.category_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id, c.name, c.tag
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
