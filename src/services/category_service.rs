use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::category::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::models::expense::Expense;
use crate::models::pagination::Pagination;
use crate::repositories::category_repository::CategoryRepository;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::{CATEGORY_NAME_CONSTRAINT, RepositoryError};

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category with this name already exists")]
    DuplicateName,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Default category not found")]
    DefaultCategoryNotFound,

    #[error("Not allowed to edit or delete default category")]
    DefaultCategoryUneditable,

    #[error("Not allowed to access this category")]
    Forbidden,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for CategoryError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => CategoryError::CategoryNotFound,
            RepositoryError::ConstraintViolation(c) if c == CATEGORY_NAME_CONSTRAINT => {
                CategoryError::DuplicateName
            }
            other => CategoryError::DatabaseError(other.to_string()),
        }
    }
}

/// Trait defining category service operations
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// Create a custom category for a user
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Get one of the user's categories
    async fn get(&self, user_id: Uuid, category_id: Uuid) -> Result<Category, CategoryError>;

    /// Update a custom category; the default category is read-only
    async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError>;

    /// Delete a custom category together with its expenses
    async fn delete(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CategoryError>;

    /// List the user's categories, default first
    async fn list(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Category>, CategoryError>;

    /// List the expenses filed under one of the user's categories
    async fn get_expenses(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<Expense>, CategoryError>;

    /// Category an expense should be filed under; `None` means the default category
    async fn resolve_for_expense(
        &self,
        user_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<Category, CategoryError>;
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
    expense_repository: Arc<dyn ExpenseRepository>,
}

impl CategoryServiceImpl {
    pub fn new(
        category_repository: Arc<dyn CategoryRepository>,
        expense_repository: Arc<dyn ExpenseRepository>,
    ) -> Self {
        Self {
            category_repository,
            expense_repository,
        }
    }

    /// Fetch a category the user may read
    async fn readable(&self, user_id: Uuid, category_id: Uuid) -> Result<Category, CategoryError> {
        let category = self
            .category_repository
            .find_by_id(category_id)
            .await?
            .ok_or(CategoryError::CategoryNotFound)?;

        if category.user_id != user_id {
            return Err(CategoryError::Forbidden);
        }
        Ok(category)
    }

    /// Fetch a category the user may modify
    async fn writable(&self, user_id: Uuid, category_id: Uuid) -> Result<Category, CategoryError> {
        let category = self.readable(user_id, category_id).await?;

        if category.is_default {
            return Err(CategoryError::DefaultCategoryUneditable);
        }
        Ok(category)
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let category = Category {
            id: Uuid::new_v4(),
            user_id,
            name: request.name,
            description: request.description,
            tag: request.tag,
            is_default: false,
            created_at: Utc::now(),
        };

        let category = self.category_repository.create(category).await?;
        tracing::info!(user_id = %user_id, category_id = %category.id, "category created");
        Ok(category)
    }

    async fn get(&self, user_id: Uuid, category_id: Uuid) -> Result<Category, CategoryError> {
        self.readable(user_id, category_id).await
    }

    async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let existing = self.writable(user_id, category_id).await?;

        let updated = Category {
            name: request.name.unwrap_or(existing.name),
            description: request.description.unwrap_or(existing.description),
            tag: request.tag.unwrap_or(existing.tag),
            ..existing
        };

        Ok(self.category_repository.update(updated).await?)
    }

    async fn delete(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CategoryError> {
        self.writable(user_id, category_id).await?;
        self.category_repository.delete(category_id).await?;
        tracing::info!(user_id = %user_id, category_id = %category_id, "category deleted");
        Ok(())
    }

    async fn list(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Category>, CategoryError> {
        Ok(self
            .category_repository
            .list_by_user(user_id, pagination)
            .await?)
    }

    async fn get_expenses(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<Expense>, CategoryError> {
        let category = self.readable(user_id, category_id).await?;
        Ok(self.expense_repository.list_by_category(category.id).await?)
    }

    async fn resolve_for_expense(
        &self,
        user_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<Category, CategoryError> {
        match category_id {
            Some(id) => self.readable(user_id, id).await,
            None => self
                .category_repository
                .find_default(user_id)
                .await?
                .ok_or(CategoryError::DefaultCategoryNotFound),
        }
    }
}
