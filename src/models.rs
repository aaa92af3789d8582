pub mod auth;
pub mod category;
pub mod expense;
pub mod pagination;
pub mod patch;
pub mod summary;
pub mod user;

pub use auth::{AuthToken, LoginRequest};
pub use category::{Category, CategoryColor, CreateCategoryRequest, UpdateCategoryRequest};
pub use expense::{CreateExpenseRequest, Expense, UpdateExpenseRequest};
pub use pagination::Pagination;
pub use summary::{CategorySpending, SpendingSummary};
pub use user::{CreateUserRequest, UpdateUserRequest, User};
