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
use crate::models::category::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::models::expense::Expense;
use crate::models::pagination::Pagination;
use crate::services::category_service::{CategoryError, CategoryService};

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        match self {
            CategoryError::DuplicateName => error_response(
                StatusCode::CONFLICT,
                "duplicate_category",
                "Category with this name already exists",
            ),
            CategoryError::CategoryNotFound | CategoryError::DefaultCategoryNotFound => {
                error_response(
                    StatusCode::NOT_FOUND,
                    "category_not_found",
                    "Category not found",
                )
            }
            CategoryError::DefaultCategoryUneditable => error_response(
                StatusCode::CONFLICT,
                "default_category",
                "Not allowed to edit or delete default category",
            ),
            CategoryError::Forbidden => error_response(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Not allowed to access this category",
            ),
            CategoryError::DatabaseError(msg) => internal_error(&msg),
        }
    }
}

/// List the authenticated user's categories, default category first
#[utoipa::path(
    get,
    path = "/me/categories",
    params(Pagination),
    responses(
        (status = 200, description = "Page of categories", body = [Category]),
        (status = 400, description = "Invalid pagination", body = super::ErrorResponse),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Category>>, Response> {
    let pagination = pagination(query)?;

    match category_service.list(auth.user_id, pagination).await {
        Ok(categories) => Ok(Json(categories)),
        Err(e) => Err(e.into_response()),
    }
}

/// Create a custom category
#[utoipa::path(
    post,
    path = "/me/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation error", body = super::ErrorResponse),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse),
        (status = 409, description = "Category name already used", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), Response> {
    let request = json_body(payload)?.normalized();
    validate(&request)?;

    match category_service.create(auth.user_id, request).await {
        Ok(category) => Ok((StatusCode::CREATED, Json(category))),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse),
        (status = 403, description = "Category belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Category not found", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn get_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, CategoryError> {
    Ok(Json(category_service.get(auth.user_id, id).await?))
}

/// Update a custom category
///
/// The default category cannot be changed.
#[utoipa::path(
    put,
    path = "/me/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated category", body = Category),
        (status = 400, description = "Validation error", body = super::ErrorResponse),
        (status = 403, description = "Category belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Category not found", body = super::ErrorResponse),
        (status = 409, description = "Default category or duplicate name", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn update_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> Result<Json<Category>, Response> {
    let request = json_body(payload)?.normalized();
    validate(&request)?;

    match category_service.update(auth.user_id, id, request).await {
        Ok(category) => Ok(Json(category)),
        Err(e) => Err(e.into_response()),
    }
}

/// Delete a custom category together with its expenses
#[utoipa::path(
    delete,
    path = "/me/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Category belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Category not found", body = super::ErrorResponse),
        (status = 409, description = "Default category cannot be deleted", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn delete_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CategoryError> {
    category_service.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List every expense filed under a category
#[utoipa::path(
    get,
    path = "/me/categories/{id}/expenses",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Expenses in the category", body = [Expense]),
        (status = 403, description = "Category belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Category not found", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn category_expenses_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Expense>>, CategoryError> {
    Ok(Json(category_service.get_expenses(auth.user_id, id).await?))
}
