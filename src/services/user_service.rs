use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::user::{UpdateUserRequest, User};
use crate::repositories::user_repository::UserRepository;
use crate::repositories::{EMAIL_CONSTRAINT, RepositoryError, USERNAME_CONSTRAINT};
use crate::services::auth_service::hash_password;

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for UserError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => UserError::UserNotFound,
            RepositoryError::ConstraintViolation(c) if c == USERNAME_CONSTRAINT => {
                UserError::DuplicateUsername
            }
            RepositoryError::ConstraintViolation(c) if c == EMAIL_CONSTRAINT => {
                UserError::DuplicateEmail
            }
            other => UserError::DatabaseError(other.to_string()),
        }
    }
}

/// Trait defining operations on the authenticated user's own profile
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<User, UserError>;

    /// Apply the provided fields; a new password is re-hashed
    async fn update(&self, user_id: Uuid, request: UpdateUserRequest) -> Result<User, UserError>;

    /// Delete the user together with all their categories and expenses
    async fn delete(&self, user_id: Uuid) -> Result<(), UserError>;
}

/// Implementation of UserService
pub struct UserServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    bcrypt_cost: u32,
}

impl UserServiceImpl {
    pub fn new(user_repository: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self {
            user_repository,
            bcrypt_cost,
        }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn get(&self, user_id: Uuid) -> Result<User, UserError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    async fn update(&self, user_id: Uuid, request: UpdateUserRequest) -> Result<User, UserError> {
        let existing = self.get(user_id).await?;

        let password_hash = match request.password {
            Some(password) => hash_password(&password, self.bcrypt_cost)
                .map_err(|e| UserError::InternalError(format!("Password hashing failed: {}", e)))?,
            None => existing.password_hash,
        };

        let updated = User {
            id: existing.id,
            username: request.username.unwrap_or(existing.username),
            email: request.email.unwrap_or(existing.email),
            password_hash,
            salary: request.salary.unwrap_or(existing.salary),
            created_at: existing.created_at,
        };

        let user = self.user_repository.update(updated).await?;
        tracing::info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), UserError> {
        self.user_repository.delete(user_id).await?;
        tracing::info!(user_id = %user_id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::LoginRequest;
    use crate::models::user::CreateUserRequest;
    use crate::repositories::memory::InMemoryStore;
    use crate::services::auth_service::{AuthService, AuthServiceImpl, AuthSettings};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct Fixture {
        auth: AuthServiceImpl,
        users: UserServiceImpl,
    }

    fn fixture(store: Arc<InMemoryStore>) -> Fixture {
        let settings = AuthSettings {
            bcrypt_cost: 4,
            ..AuthSettings::new("test_secret")
        };
        Fixture {
            auth: AuthServiceImpl::new(store.clone(), settings),
            users: UserServiceImpl::new(store, 4),
        }
    }

    async fn register(fixture: &Fixture, username: &str) -> User {
        fixture
            .auth
            .register(CreateUserRequest {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: "password123".to_string(),
                salary: Some(Decimal::from(3000)),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_user() {
        let fixture = fixture(Arc::new(InMemoryStore::new()));
        let user = register(&fixture, "alice").await;

        let fetched = fixture.users.get(user.id).await.unwrap();
        assert_eq!(fetched.username, "alice");
        assert_eq!(fetched.salary, Some(Decimal::from(3000)));

        let missing = fixture.users.get(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(UserError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_update_only_given_fields() {
        let fixture = fixture(Arc::new(InMemoryStore::new()));
        let user = register(&fixture, "alice").await;

        let request = UpdateUserRequest {
            salary: Some(Some(Decimal::from_str("4500.50").unwrap())),
            ..Default::default()
        };
        let updated = fixture.users.update(user.id, request).await.unwrap();

        assert_eq!(updated.salary, Some(Decimal::from_str("4500.50").unwrap()));
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "alice@example.com");
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_update_clears_salary() {
        let fixture = fixture(Arc::new(InMemoryStore::new()));
        let user = register(&fixture, "alice").await;

        let request = UpdateUserRequest {
            salary: Some(None),
            ..Default::default()
        };
        let updated = fixture.users.update(user.id, request).await.unwrap();
        assert!(updated.salary.is_none());

        let untouched = fixture
            .users
            .update(user.id, UpdateUserRequest::default())
            .await
            .unwrap();
        assert!(untouched.salary.is_none());
    }

    #[tokio::test]
    async fn test_update_password_allows_new_login() {
        let fixture = fixture(Arc::new(InMemoryStore::new()));
        let user = register(&fixture, "alice").await;

        let request = UpdateUserRequest {
            password: Some("brand-new-password".to_string()),
            ..Default::default()
        };
        fixture.users.update(user.id, request).await.unwrap();

        let old = fixture
            .auth
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "password123".to_string(),
            })
            .await;
        assert!(old.is_err());

        let new = fixture
            .auth
            .login(LoginRequest {
                username: "alice".to_string(),
                password: "brand-new-password".to_string(),
            })
            .await;
        assert!(new.is_ok());
    }

    #[tokio::test]
    async fn test_update_to_taken_username() {
        let fixture = fixture(Arc::new(InMemoryStore::new()));
        register(&fixture, "alice").await;
        let bob = register(&fixture, "bob").await;

        let request = UpdateUserRequest {
            username: Some("alice".to_string()),
            ..Default::default()
        };
        let result = fixture.users.update(bob.id, request).await;
        assert!(matches!(result, Err(UserError::DuplicateUsername)));

        let request = UpdateUserRequest {
            email: Some("alice@example.com".to_string()),
            ..Default::default()
        };
        let result = fixture.users.update(bob.id, request).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let fixture = fixture(Arc::new(InMemoryStore::new()));
        let user = register(&fixture, "alice").await;

        fixture.users.delete(user.id).await.unwrap();

        assert!(matches!(
            fixture.users.get(user.id).await,
            Err(UserError::UserNotFound)
        ));
        assert!(matches!(
            fixture.users.delete(user.id).await,
            Err(UserError::UserNotFound)
        ));
    }
}
