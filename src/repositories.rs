pub mod category_repository;
pub mod expense_repository;
pub mod memory;
pub mod user_repository;

/// Unique constraint on `users.username`
pub const USERNAME_CONSTRAINT: &str = "uq_users_username";
/// Unique constraint on `users.email`
pub const EMAIL_CONSTRAINT: &str = "uq_users_email";
/// Unique constraint on `(categories.user_id, categories.name)`
pub const CATEGORY_NAME_CONSTRAINT: &str = "uq_category_name_user";
/// Partial unique index allowing a single default category per user
pub const DEFAULT_CATEGORY_CONSTRAINT: &str = "uq_one_default_per_user";

/// Repository errors for database operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Resource not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Carries the name of the violated constraint
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
            {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                RepositoryError::ConstraintViolation(constraint)
            }
            e => RepositoryError::DatabaseError(e.to_string()),
        }
    }
}
