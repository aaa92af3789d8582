use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::{error_response, internal_error, json_body, pagination, validate};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::expense::{CreateExpenseRequest, Expense, UpdateExpenseRequest};
use crate::models::pagination::Pagination;
use crate::models::summary::SpendingSummary;
use crate::services::expense_service::{ExpenseError, ExpenseService};

impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        match self {
            ExpenseError::ExpenseNotFound => error_response(
                StatusCode::NOT_FOUND,
                "expense_not_found",
                "Expense not found",
            ),
            ExpenseError::CategoryNotFound => error_response(
                StatusCode::NOT_FOUND,
                "category_not_found",
                "Category not found",
            ),
            ExpenseError::UserNotFound => {
                error_response(StatusCode::NOT_FOUND, "user_not_found", "User not found")
            }
            ExpenseError::Forbidden => error_response(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Not allowed to access this resource",
            ),
            ExpenseError::Overflow(e) => internal_error(&e.to_string()),
            ExpenseError::DatabaseError(msg) => internal_error(&msg),
        }
    }
}

/// List the authenticated user's expenses, newest first
#[utoipa::path(
    get,
    path = "/me/expenses",
    params(Pagination),
    responses(
        (status = 200, description = "Page of expenses", body = [Expense]),
        (status = 400, description = "Invalid pagination", body = super::ErrorResponse),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn list_expenses_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Expense>>, Response> {
    let pagination = pagination(query)?;

    match expense_service.list(auth.user_id, pagination).await {
        Ok(expenses) => Ok(Json(expenses)),
        Err(e) => Err(e.into_response()),
    }
}

/// Record an expense
///
/// Without a `category_id` the expense lands in the default category.
#[utoipa::path(
    post,
    path = "/me/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = Expense),
        (status = 400, description = "Validation error", body = super::ErrorResponse),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse),
        (status = 403, description = "Category belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Category not found", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn create_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), Response> {
    let request = json_body(payload)?.normalized();
    validate(&request)?;

    match expense_service.create(auth.user_id, request).await {
        Ok(expense) => Ok((StatusCode::CREATED, Json(expense))),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense", body = Expense),
        (status = 403, description = "Expense belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Expense not found", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn get_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, ExpenseError> {
    Ok(Json(expense_service.get(auth.user_id, id).await?))
}

/// Update an expense
///
/// Omitting `category_id` keeps the expense in its current category.
#[utoipa::path(
    put,
    path = "/me/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense id")),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Updated expense", body = Expense),
        (status = 400, description = "Validation error", body = super::ErrorResponse),
        (status = 403, description = "Expense or category belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Expense or category not found", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn update_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateExpenseRequest>, JsonRejection>,
) -> Result<Json<Expense>, Response> {
    let request = json_body(payload)?.normalized();
    validate(&request)?;

    match expense_service.update(auth.user_id, id, request).await {
        Ok(expense) => Ok(Json(expense)),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/me/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 403, description = "Expense belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Expense not found", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn delete_expense_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ExpenseError> {
    expense_service.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Spending dashboard for the authenticated user
///
/// Totals per category, overall spend and what is left of the salary.
#[utoipa::path(
    get,
    path = "/me/summary",
    responses(
        (status = 200, description = "Spending summary", body = SpendingSummary),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse),
        (status = 404, description = "User no longer exists", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn summary_handler(
    State(expense_service): State<Arc<dyn ExpenseService>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SpendingSummary>, ExpenseError> {
    Ok(Json(expense_service.summary(auth.user_id).await?))
}
