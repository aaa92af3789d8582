use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::category::Category;
use crate::models::pagination::Pagination;

/// Trait defining category repository operations
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Find a category by ID, regardless of owner
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError>;

    /// Find the default category of a user
    async fn find_default(&self, user_id: Uuid) -> Result<Option<Category>, RepositoryError>;

    /// List a user's categories, default first and then by name
    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Category>, RepositoryError>;

    /// Persist changed name, description and tag
    async fn update(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Delete a category and its expenses
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, user_id, name, description, tag, is_default, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, name, description, tag, is_default, created_at
            "#,
        )
        .bind(category.id)
        .bind(category.user_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.tag)
        .bind(category.is_default)
        .bind(category.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, description, tag, is_default, created_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn find_default(&self, user_id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, description, tag, is_default, created_at
            FROM categories
            WHERE user_id = $1 AND is_default
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, user_id, name, description, tag, is_default, created_at
            FROM categories
            WHERE user_id = $1
            ORDER BY is_default DESC, name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
        // The default category is never touched, even if a caller slips one through
        let updated = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2,
                description = $3,
                tag = $4
            WHERE id = $1 AND NOT is_default
            RETURNING id, user_id, name, description, tag, is_default, created_at
            "#,
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.tag)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND NOT is_default")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
