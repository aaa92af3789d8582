use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{error_response, internal_error, json_body, validate};
use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::user::{CreateUserRequest, User};
use crate::services::auth_service::{AuthError, AuthService};

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AuthError::DuplicateUsername => (
                StatusCode::CONFLICT,
                "duplicate_username",
                "Username already exists",
            ),
            AuthError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "duplicate_email",
                "Email already exists",
            ),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Incorrect username or password",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Could not validate credentials",
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Token has expired",
            ),
            AuthError::DatabaseError(ref msg) | AuthError::InternalError(ref msg) => {
                return internal_error(msg);
            }
        };

        let mut response = error_response(status, error_type, message);
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Handler for user signup
///
/// Creates a new user account along with its default category.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User successfully registered", body = User),
        (status = 400, description = "Validation error", body = super::ErrorResponse),
        (status = 409, description = "Username or email already exists", body = super::ErrorResponse),
        (status = 500, description = "Internal server error", body = super::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), Response> {
    let request = json_body(payload)?.normalized();
    validate(&request)?;

    match auth_service.register(request).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for user login
///
/// Authenticates a user and returns a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthToken),
        (status = 401, description = "Invalid credentials", body = super::ErrorResponse),
        (status = 500, description = "Internal server error", body = super::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthToken>, Response> {
    let request = json_body(payload)?.normalized();

    match auth_service.login(request).await {
        Ok(token) => Ok(Json(token)),
        Err(e) => Err(e.into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::InMemoryStore;
    use crate::services::auth_service::{AuthServiceImpl, AuthSettings};

    fn auth_service() -> Arc<dyn AuthService> {
        Arc::new(AuthServiceImpl::new(
            Arc::new(InMemoryStore::new()),
            AuthSettings {
                bcrypt_cost: 4,
                ..AuthSettings::new("test_secret")
            },
        ))
    }

    fn signup_request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            salary: None,
        }
    }

    #[tokio::test]
    async fn test_signup_handler_success() {
        let auth_service = auth_service();
        let request = signup_request("  Test_User ", "Test@Example.com");

        let result = signup_handler(State(auth_service), Ok(Json(request))).await;
        assert!(result.is_ok());

        let (status, Json(user)) = result.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.username, "test_user");
        assert_eq!(user.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_signup_handler_validation_error() {
        let auth_service = auth_service();

        for request in [
            signup_request("test_user", "invalid-email"),
            signup_request("no spaces allowed", "test@example.com"),
            signup_request("ab", "test@example.com"),
        ] {
            let result = signup_handler(State(auth_service.clone()), Ok(Json(request))).await;
            let response = result.unwrap_err();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_signup_handler_duplicate_username() {
        let auth_service = auth_service();

        let first = signup_request("test_user", "first@example.com");
        let _ = signup_handler(State(auth_service.clone()), Ok(Json(first))).await;

        // Usernames are compared after lowercasing
        let second = signup_request("TEST_USER", "second@example.com");
        let result = signup_handler(State(auth_service), Ok(Json(second))).await;
        assert_eq!(result.unwrap_err().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_handler_success() {
        let auth_service = auth_service();

        let register = signup_request("test_user", "test@example.com");
        let _ = signup_handler(State(auth_service.clone()), Ok(Json(register))).await;

        let login_request = LoginRequest {
            username: "Test_User".to_string(),
            password: "password123".to_string(),
        };

        let result = login_handler(State(auth_service), Ok(Json(login_request))).await;
        let Json(token) = result.unwrap();
        assert!(!token.access_token.is_empty());
        assert_eq!(token.token_type, "bearer");
    }

    #[tokio::test]
    async fn test_login_handler_invalid_credentials() {
        let auth_service = auth_service();

        let register = signup_request("test_user", "test@example.com");
        let _ = signup_handler(State(auth_service.clone()), Ok(Json(register))).await;

        let login_request = LoginRequest {
            username: "test_user".to_string(),
            password: "wrongpassword".to_string(),
        };

        let result = login_handler(State(auth_service), Ok(Json(login_request))).await;
        let response = result.unwrap_err();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
