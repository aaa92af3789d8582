use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::expense::{CreateExpenseRequest, Expense, UpdateExpenseRequest};
use crate::models::pagination::Pagination;
use crate::models::summary::{SpendingSummary, SummaryOverflow};
use crate::repositories::RepositoryError;
use crate::repositories::expense_repository::ExpenseRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::category_service::{CategoryError, CategoryService};

/// Expense service errors
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Expense not found")]
    ExpenseNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Not allowed to access this resource")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Overflow(#[from] SummaryOverflow),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<RepositoryError> for ExpenseError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => ExpenseError::ExpenseNotFound,
            other => ExpenseError::DatabaseError(other.to_string()),
        }
    }
}

impl From<CategoryError> for ExpenseError {
    fn from(error: CategoryError) -> Self {
        match error {
            CategoryError::CategoryNotFound | CategoryError::DefaultCategoryNotFound => {
                ExpenseError::CategoryNotFound
            }
            CategoryError::Forbidden => ExpenseError::Forbidden,
            other => ExpenseError::DatabaseError(other.to_string()),
        }
    }
}

/// Trait defining expense service operations
#[async_trait]
pub trait ExpenseService: Send + Sync {
    /// Record an expense, filed under the user's default category when none is given
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    async fn get(&self, user_id: Uuid, expense_id: Uuid) -> Result<Expense, ExpenseError>;

    /// List the user's expenses, newest first
    async fn list(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Expense>, ExpenseError>;

    /// Apply the provided fields; an omitted category leaves the expense where it is
    async fn update(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError>;

    async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ExpenseError>;

    /// Totals per category measured against the user's salary
    async fn summary(&self, user_id: Uuid) -> Result<SpendingSummary, ExpenseError>;
}

/// Implementation of ExpenseService
pub struct ExpenseServiceImpl {
    expense_repository: Arc<dyn ExpenseRepository>,
    category_service: Arc<dyn CategoryService>,
    user_repository: Arc<dyn UserRepository>,
}

impl ExpenseServiceImpl {
    pub fn new(
        expense_repository: Arc<dyn ExpenseRepository>,
        category_service: Arc<dyn CategoryService>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            expense_repository,
            category_service,
            user_repository,
        }
    }

    async fn owned(&self, user_id: Uuid, expense_id: Uuid) -> Result<Expense, ExpenseError> {
        let expense = self
            .expense_repository
            .find_by_id(expense_id)
            .await?
            .ok_or(ExpenseError::ExpenseNotFound)?;

        if expense.user_id != user_id {
            return Err(ExpenseError::Forbidden);
        }
        Ok(expense)
    }
}

#[async_trait]
impl ExpenseService for ExpenseServiceImpl {
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let category = self
            .category_service
            .resolve_for_expense(user_id, request.category_id)
            .await?;

        let expense = Expense {
            id: Uuid::new_v4(),
            user_id,
            category_id: category.id,
            name: request.name,
            amount: request.amount,
            description: request.description,
            created_at: Utc::now(),
            updated_at: None,
        };

        let expense = self.expense_repository.create(expense).await?;
        tracing::info!(
            user_id = %user_id,
            expense_id = %expense.id,
            category_id = %expense.category_id,
            "expense recorded"
        );
        Ok(expense)
    }

    async fn get(&self, user_id: Uuid, expense_id: Uuid) -> Result<Expense, ExpenseError> {
        self.owned(user_id, expense_id).await
    }

    async fn list(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Expense>, ExpenseError> {
        Ok(self
            .expense_repository
            .list_by_user(user_id, pagination)
            .await?)
    }

    async fn update(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let existing = self.owned(user_id, expense_id).await?;

        let category_id = match request.category_id {
            Some(id) => {
                self.category_service
                    .resolve_for_expense(user_id, Some(id))
                    .await?
                    .id
            }
            None => existing.category_id,
        };

        let updated = Expense {
            category_id,
            name: request.name.unwrap_or(existing.name),
            amount: request.amount.unwrap_or(existing.amount),
            description: request.description.unwrap_or(existing.description),
            updated_at: Some(Utc::now()),
            ..existing
        };

        Ok(self.expense_repository.update(updated).await?)
    }

    async fn delete(&self, user_id: Uuid, expense_id: Uuid) -> Result<(), ExpenseError> {
        self.owned(user_id, expense_id).await?;
        self.expense_repository.delete(expense_id).await?;
        tracing::info!(user_id = %user_id, expense_id = %expense_id, "expense deleted");
        Ok(())
    }

    async fn summary(&self, user_id: Uuid) -> Result<SpendingSummary, ExpenseError> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(ExpenseError::UserNotFound)?;

        let categories = self.expense_repository.spending_by_category(user_id).await?;
        Ok(SpendingSummary::from_categories(user.salary, categories)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::{Category, CreateCategoryRequest, DefaultCategory};
    use crate::models::user::User;
    use crate::repositories::memory::InMemoryStore;
    use crate::services::category_service::CategoryServiceImpl;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct Fixture {
        store: Arc<InMemoryStore>,
        categories: Arc<CategoryServiceImpl>,
        expenses: ExpenseServiceImpl,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let categories = Arc::new(CategoryServiceImpl::new(store.clone(), store.clone()));
        let expenses = ExpenseServiceImpl::new(store.clone(), categories.clone(), store.clone());
        Fixture {
            store,
            categories,
            expenses,
        }
    }

    async fn add_user(store: &InMemoryStore, salary: Option<&str>) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            username: format!("user{}", Uuid::new_v4().simple()),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            password_hash: "hash".to_string(),
            salary: salary.map(|s| Decimal::from_str(s).unwrap()),
            created_at: Utc::now(),
        };
        let default = Category::default_for(user.id, &DefaultCategory::default());
        UserRepository::create(store, user, default).await.unwrap().id
    }

    async fn add_category(fixture: &Fixture, user_id: Uuid, name: &str) -> Category {
        fixture
            .categories
            .create(
                user_id,
                CreateCategoryRequest {
                    name: name.to_string(),
                    description: None,
                    tag: None,
                },
            )
            .await
            .unwrap()
    }

    fn expense(name: &str, amount: &str, category_id: Option<Uuid>) -> CreateExpenseRequest {
        CreateExpenseRequest {
            name: name.to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            description: None,
            category_id,
        }
    }

    #[tokio::test]
    async fn test_create_falls_back_to_default_category() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, None).await;

        let created = fixture
            .expenses
            .create(alice, expense("coffee", "3.50", None))
            .await
            .unwrap();

        let category = fixture.categories.get(alice, created.category_id).await.unwrap();
        assert!(category.is_default);
        assert!(created.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_create_in_foreign_or_missing_category() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, None).await;
        let bob = add_user(&fixture.store, None).await;
        let bobs = add_category(&fixture, bob, "food").await;

        let result = fixture
            .expenses
            .create(alice, expense("bread", "2", Some(bobs.id)))
            .await;
        assert!(matches!(result, Err(ExpenseError::Forbidden)));

        let result = fixture
            .expenses
            .create(alice, expense("bread", "2", Some(Uuid::new_v4())))
            .await;
        assert!(matches!(result, Err(ExpenseError::CategoryNotFound)));
    }

    #[tokio::test]
    async fn test_foreign_expense_is_forbidden() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, None).await;
        let bob = add_user(&fixture.store, None).await;

        let created = fixture
            .expenses
            .create(alice, expense("coffee", "3.50", None))
            .await
            .unwrap();

        assert!(matches!(
            fixture.expenses.get(bob, created.id).await,
            Err(ExpenseError::Forbidden)
        ));
        assert!(matches!(
            fixture
                .expenses
                .update(bob, created.id, UpdateExpenseRequest::default())
                .await,
            Err(ExpenseError::Forbidden)
        ));
        assert!(matches!(
            fixture.expenses.delete(bob, created.id).await,
            Err(ExpenseError::Forbidden)
        ));
        assert!(matches!(
            fixture.expenses.get(alice, Uuid::new_v4()).await,
            Err(ExpenseError::ExpenseNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_category_when_omitted() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, None).await;
        let food = add_category(&fixture, alice, "food").await;

        let created = fixture
            .expenses
            .create(alice, expense("bread", "2.10", Some(food.id)))
            .await
            .unwrap();

        let request = UpdateExpenseRequest {
            amount: Some(Decimal::from_str("2.40").unwrap()),
            ..Default::default()
        };
        let updated = fixture
            .expenses
            .update(alice, created.id, request)
            .await
            .unwrap();

        assert_eq!(updated.category_id, food.id);
        assert_eq!(updated.amount, Decimal::from_str("2.40").unwrap());
        assert_eq!(updated.name, "bread");
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_clears_description_only_when_null() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, None).await;

        let created = fixture
            .expenses
            .create(
                alice,
                CreateExpenseRequest {
                    description: Some("farmers market".to_string()),
                    ..expense("bread", "2", None)
                },
            )
            .await
            .unwrap();

        let renamed = fixture
            .expenses
            .update(
                alice,
                created.id,
                UpdateExpenseRequest {
                    name: Some("rye bread".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.description.as_deref(), Some("farmers market"));

        let cleared = fixture
            .expenses
            .update(
                alice,
                created.id,
                UpdateExpenseRequest {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.description.is_none());
        assert_eq!(cleared.name, "rye bread");
    }

    #[tokio::test]
    async fn test_update_moves_between_own_categories() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, None).await;
        let food = add_category(&fixture, alice, "food").await;

        let created = fixture
            .expenses
            .create(alice, expense("bread", "2", None))
            .await
            .unwrap();

        let request = UpdateExpenseRequest {
            category_id: Some(food.id),
            ..Default::default()
        };
        let updated = fixture
            .expenses
            .update(alice, created.id, request)
            .await
            .unwrap();
        assert_eq!(updated.category_id, food.id);
    }

    #[tokio::test]
    async fn test_delete_expense() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, None).await;

        let created = fixture
            .expenses
            .create(alice, expense("coffee", "3", None))
            .await
            .unwrap();

        fixture.expenses.delete(alice, created.id).await.unwrap();
        assert!(matches!(
            fixture.expenses.get(alice, created.id).await,
            Err(ExpenseError::ExpenseNotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_paginated_newest_first() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, None).await;
        let bob = add_user(&fixture.store, None).await;

        for i in 0..7 {
            fixture
                .expenses
                .create(alice, expense(&format!("item {}", i), "1", None))
                .await
                .unwrap();
        }
        fixture
            .expenses
            .create(bob, expense("not mine", "1", None))
            .await
            .unwrap();

        let page = fixture
            .expenses
            .list(alice, Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 5);
        assert!(page.iter().all(|e| e.user_id == alice));
        assert!(page.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let rest = fixture
            .expenses
            .list(alice, Pagination::new(5, 5))
            .await
            .unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn test_summary() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, Some("2000")).await;
        let food = add_category(&fixture, alice, "food").await;
        add_category(&fixture, alice, "travel").await;

        for (name, amount, category) in [
            ("bread", "150.25", Some(food.id)),
            ("cheese", "49.75", Some(food.id)),
            ("misc", "100", None),
        ] {
            fixture
                .expenses
                .create(alice, expense(name, amount, category))
                .await
                .unwrap();
        }

        let summary = fixture.expenses.summary(alice).await.unwrap();

        assert_eq!(summary.salary, Some(Decimal::from(2000)));
        assert_eq!(summary.total_spent, Decimal::from(300));
        assert_eq!(summary.remaining, Decimal::from(1700));
        assert_eq!(summary.spent_percentage, Some(Decimal::from(15)));
        assert_eq!(summary.expense_count, 3);

        let names: Vec<&str> = summary.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["food", "Uncategorized", "travel"]);
        assert_eq!(summary.categories[0].total, Decimal::from(200));
        assert_eq!(summary.categories[0].expense_count, 2);
        assert_eq!(summary.categories[2].total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_summary_overflow_is_an_error() {
        let fixture = fixture();
        let alice = add_user(&fixture.store, Some("0.0000000000000000000000000001")).await;
        fixture
            .expenses
            .create(alice, expense("rent", "5", None))
            .await
            .unwrap();

        let result = fixture.expenses.summary(alice).await;
        assert!(matches!(result, Err(ExpenseError::Overflow(_))));
    }

    #[tokio::test]
    async fn test_summary_for_missing_user() {
        let fixture = fixture();
        let result = fixture.expenses.summary(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ExpenseError::UserNotFound)));
    }
}
