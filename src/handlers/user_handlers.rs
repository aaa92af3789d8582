use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{error_response, internal_error, json_body, validate};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::user::{UpdateUserRequest, User};
use crate::services::user_service::{UserError, UserService};

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match self {
            UserError::UserNotFound => {
                error_response(StatusCode::NOT_FOUND, "user_not_found", "User not found")
            }
            UserError::DuplicateUsername => error_response(
                StatusCode::CONFLICT,
                "duplicate_username",
                "Username already exists",
            ),
            UserError::DuplicateEmail => error_response(
                StatusCode::CONFLICT,
                "duplicate_email",
                "Email already exists",
            ),
            UserError::DatabaseError(msg) | UserError::InternalError(msg) => internal_error(&msg),
        }
    }
}

/// Return the authenticated user's profile
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse),
        (status = 404, description = "User no longer exists", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_me_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<User>, UserError> {
    Ok(Json(user_service.get(auth.user_id).await?))
}

/// Update the authenticated user's profile
///
/// Only the provided fields change. A new password is re-hashed.
#[utoipa::path(
    put,
    path = "/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Validation error", body = super::ErrorResponse),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse),
        (status = 409, description = "Username or email already exists", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_me_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, Response> {
    let request = json_body(payload)?.normalized();
    validate(&request)?;

    match user_service.update(auth.user_id, request).await {
        Ok(user) => Ok(Json(user)),
        Err(e) => Err(e.into_response()),
    }
}

/// Delete the authenticated user with all their categories and expenses
#[utoipa::path(
    delete,
    path = "/me",
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not authenticated", body = super::ErrorResponse),
        (status = 404, description = "User no longer exists", body = super::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_me_handler(
    State(user_service): State<Arc<dyn UserService>>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<StatusCode, UserError> {
    user_service.delete(auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
