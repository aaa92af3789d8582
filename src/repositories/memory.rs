//! In-memory repositories backed by a single mutex-guarded store.
//!
//! Mirrors the constraints and cascades of the PostgreSQL schema so services
//! behave the same against either backend. Used by the test suites.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::category_repository::CategoryRepository;
use super::expense_repository::ExpenseRepository;
use super::user_repository::UserRepository;
use super::{
    CATEGORY_NAME_CONSTRAINT, DEFAULT_CATEGORY_CONSTRAINT, EMAIL_CONSTRAINT, RepositoryError,
    USERNAME_CONSTRAINT,
};
use crate::models::category::Category;
use crate::models::expense::Expense;
use crate::models::pagination::Pagination;
use crate::models::summary::CategorySpending;
use crate::models::user::User;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    expenses: HashMap<Uuid, Expense>,
}

impl State {
    fn check_user_unique(&self, user: &User) -> Result<(), RepositoryError> {
        for existing in self.users.values().filter(|u| u.id != user.id) {
            if existing.username == user.username {
                return Err(RepositoryError::ConstraintViolation(
                    USERNAME_CONSTRAINT.to_string(),
                ));
            }
            if existing.email == user.email {
                return Err(RepositoryError::ConstraintViolation(
                    EMAIL_CONSTRAINT.to_string(),
                ));
            }
        }
        Ok(())
    }

    fn check_category_unique(&self, category: &Category) -> Result<(), RepositoryError> {
        for existing in self
            .categories
            .values()
            .filter(|c| c.id != category.id && c.user_id == category.user_id)
        {
            if existing.name == category.name {
                return Err(RepositoryError::ConstraintViolation(
                    CATEGORY_NAME_CONSTRAINT.to_string(),
                ));
            }
            if existing.is_default && category.is_default {
                return Err(RepositoryError::ConstraintViolation(
                    DEFAULT_CATEGORY_CONSTRAINT.to_string(),
                ));
            }
        }
        Ok(())
    }

    fn check_expense_references(&self, expense: &Expense) -> Result<(), RepositoryError> {
        if !self.users.contains_key(&expense.user_id)
            || !self.categories.contains_key(&expense.category_id)
        {
            return Err(RepositoryError::ConstraintViolation(
                "expenses_category_id_fkey".to_string(),
            ));
        }
        Ok(())
    }

    fn remove_category(&mut self, id: Uuid) {
        self.categories.remove(&id);
        self.expenses.retain(|_, e| e.category_id != id);
    }
}

/// Shared in-memory store implementing every repository trait
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    should_fail: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with a database error
    pub fn with_failure() -> Self {
        Self {
            state: Mutex::new(State::default()),
            should_fail: true,
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        if self.should_fail {
            return Err(RepositoryError::DatabaseError(
                "Database connection failed".to_string(),
            ));
        }
        self.state
            .lock()
            .map_err(|_| RepositoryError::DatabaseError("Store lock poisoned".to_string()))
    }
}

fn newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User, default_category: Category) -> Result<User, RepositoryError> {
        let mut state = self.state()?;
        state.check_user_unique(&user)?;

        let default_category = Category {
            user_id: user.id,
            is_default: true,
            ..default_category
        };
        state.check_category_unique(&default_category)?;

        state.users.insert(user.id, user.clone());
        state
            .categories
            .insert(default_category.id, default_category);
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.state()?.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state()?;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.state()?;
        if !state.users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        state.check_user_unique(&user)?;
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.users.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        state.categories.retain(|_, c| c.user_id != id);
        state.expenses.retain(|_, e| e.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        let mut state = self.state()?;
        if !state.users.contains_key(&category.user_id) {
            return Err(RepositoryError::ConstraintViolation(
                "categories_user_id_fkey".to_string(),
            ));
        }
        state.check_category_unique(&category)?;
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepositoryError> {
        Ok(self.state()?.categories.get(&id).cloned())
    }

    async fn find_default(&self, user_id: Uuid) -> Result<Option<Category>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .categories
            .values()
            .find(|c| c.user_id == user_id && c.is_default)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Category>, RepositoryError> {
        let state = self.state()?;
        let mut categories: Vec<Category> = state
            .categories
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(a.name.cmp(&b.name)));
        Ok(pagination.apply(categories))
    }

    async fn update(&self, category: Category) -> Result<Category, RepositoryError> {
        let mut state = self.state()?;
        let existing = state
            .categories
            .get(&category.id)
            .filter(|c| !c.is_default)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        let updated = Category {
            name: category.name,
            description: category.description,
            tag: category.tag,
            ..existing
        };
        state.check_category_unique(&updated)?;
        state.categories.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let deletable = state.categories.get(&id).is_some_and(|c| !c.is_default);
        if !deletable {
            return Err(RepositoryError::NotFound);
        }
        state.remove_category(id);
        Ok(())
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryStore {
    async fn create(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let mut state = self.state()?;
        state.check_expense_references(&expense)?;
        state.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        Ok(self.state()?.expenses.get(&id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let state = self.state()?;
        let mut expenses: Vec<Expense> = state
            .expenses
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut expenses);
        Ok(pagination.apply(expenses))
    }

    async fn list_by_category(&self, category_id: Uuid) -> Result<Vec<Expense>, RepositoryError> {
        let state = self.state()?;
        let mut expenses: Vec<Expense> = state
            .expenses
            .values()
            .filter(|e| e.category_id == category_id)
            .cloned()
            .collect();
        newest_first(&mut expenses);
        Ok(expenses)
    }

    async fn update(&self, expense: Expense) -> Result<Expense, RepositoryError> {
        let mut state = self.state()?;
        if !state.expenses.contains_key(&expense.id) {
            return Err(RepositoryError::NotFound);
        }
        state.check_expense_references(&expense)?;
        state.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.expenses.remove(&id).is_some() {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn spending_by_category(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CategorySpending>, RepositoryError> {
        let state = self.state()?;
        state
            .categories
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|category| {
                let expenses = state
                    .expenses
                    .values()
                    .filter(|e| e.category_id == category.id);
                // Same failure Postgres reports for a numeric overflow
                let total = expenses
                    .clone()
                    .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
                    .ok_or_else(|| {
                        RepositoryError::DatabaseError("numeric field overflow".to_string())
                    })?;
                Ok(CategorySpending {
                    category_id: category.id,
                    name: category.name.clone(),
                    tag: category.tag,
                    total,
                    expense_count: expenses.count() as i64,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::DefaultCategory;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn user(username: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            salary: None,
            created_at: Utc::now(),
        }
    }

    async fn create_user(store: &InMemoryStore, username: &str) -> User {
        let user = user(username, &format!("{}@example.com", username));
        let default = Category::default_for(user.id, &DefaultCategory::default());
        UserRepository::create(store, user, default).await.unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_report_constraint() {
        let store = InMemoryStore::new();
        create_user(&store, "alice").await;

        let dup_name = user("alice", "other@example.com");
        let default = Category::default_for(dup_name.id, &DefaultCategory::default());
        let result = UserRepository::create(&store, dup_name, default).await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConstraintViolation(c)) if c == USERNAME_CONSTRAINT
        ));

        let dup_email = user("bob", "alice@example.com");
        let default = Category::default_for(dup_email.id, &DefaultCategory::default());
        let result = UserRepository::create(&store, dup_email, default).await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConstraintViolation(c)) if c == EMAIL_CONSTRAINT
        ));
    }

    #[tokio::test]
    async fn test_second_default_category_rejected() {
        let store = InMemoryStore::new();
        let alice = create_user(&store, "alice").await;

        let mut second = Category::default_for(alice.id, &DefaultCategory::default());
        second.name = "another default".to_string();

        let result = CategoryRepository::create(&store, second).await;
        assert!(matches!(
            result,
            Err(RepositoryError::ConstraintViolation(c)) if c == DEFAULT_CATEGORY_CONSTRAINT
        ));
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let store = InMemoryStore::new();
        let alice = create_user(&store, "alice").await;
        let default = store.find_default(alice.id).await.unwrap().unwrap();

        let expense = Expense {
            id: Uuid::new_v4(),
            user_id: alice.id,
            category_id: default.id,
            name: "coffee".to_string(),
            amount: Decimal::from(3),
            description: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        ExpenseRepository::create(&store, expense.clone()).await.unwrap();

        UserRepository::delete(&store, alice.id).await.unwrap();

        assert!(store.find_default(alice.id).await.unwrap().is_none());
        assert!(ExpenseRepository::find_by_id(&store, expense.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_default_category_cannot_be_deleted_or_updated() {
        let store = InMemoryStore::new();
        let alice = create_user(&store, "alice").await;
        let default = store.find_default(alice.id).await.unwrap().unwrap();

        let result = CategoryRepository::delete(&store, default.id).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));

        let result = CategoryRepository::update(&store, default.clone()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = InMemoryStore::with_failure();
        let result = UserRepository::find_by_id(&store, Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepositoryError::DatabaseError(_))));
    }
}
