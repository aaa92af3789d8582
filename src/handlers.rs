pub mod auth_handlers;
pub mod category_handlers;
pub mod expense_handlers;
pub mod user_handlers;

use axum::{
    Json,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::pagination::Pagination;
use crate::validation::describe_errors;

/// Error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

/// Build a JSON error response
pub(crate) fn error_response(
    status: StatusCode,
    error: &str,
    message: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, message))).into_response()
}

/// Log a storage failure and hide its details from the client
pub(crate) fn internal_error(detail: &str) -> Response {
    tracing::error!(error = %detail, "request failed");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Internal server error",
    )
}

/// Unwrap a JSON body, turning malformed payloads into the common error shape
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(error_response(
            rejection.status(),
            "invalid_body",
            rejection.body_text(),
        )),
    }
}

/// Run validator rules on a request body
pub(crate) fn validate<T: Validate>(request: &T) -> Result<(), Response> {
    request.validate().map_err(|errors| {
        error_response(
            StatusCode::BAD_REQUEST,
            "validation_error",
            describe_errors(&errors),
        )
    })
}

/// Extract and check `?limit=&offset=`
pub(crate) fn pagination(
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Pagination, Response> {
    let Query(pagination) = query.map_err(|rejection| {
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_query",
            rejection.body_text(),
        )
    })?;
    validate(&pagination)?;
    Ok(pagination)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_shape() {
        let result = validate(&Pagination::new(500, 0));
        let response = result.unwrap_err();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().unwrap().starts_with("limit:"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = internal_error("connection refused");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
