use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::patch::deserialize_nullable;
use crate::validation::{trim, validate_money, validate_username};

/// User entity representing a registered user in the system
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Monthly salary used by the dashboard summary
    pub salary: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for user signup
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "username": "john_doe",
    "email": "john.doe@example.com",
    "password": "securepassword123",
    "salary": "4200.00"
}))]
pub struct CreateUserRequest {
    #[validate(
        length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 128, message = "Email must be at most 128 characters")
    )]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    #[validate(custom(function = "validate_money"))]
    pub salary: Option<Decimal>,
}

impl CreateUserRequest {
    /// Trims and lowercases the identifying fields
    pub fn normalized(self) -> Self {
        Self {
            username: trim(self.username).to_lowercase(),
            email: trim(self.email).to_lowercase(),
            ..self
        }
    }
}

/// Request payload for updating the authenticated user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "salary": "5000.00"
}))]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 128, message = "Email must be at most 128 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: Option<String>,

    /// `null` clears the salary
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<String>)]
    pub salary: Option<Option<Decimal>>,
}

impl UpdateUserRequest {
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.map(|u| trim(u).to_lowercase()),
            email: self.email.map(|e| trim(e).to_lowercase()),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: "t@t.com".to_string(),
            password: "validpass".to_string(),
            salary: None,
        }
    }

    #[test]
    fn test_username_boundaries() {
        let too_long = "a".repeat(51);
        let longest = "a".repeat(50);

        for rejected in ["ab", too_long.as_str(), "user name", "user@name!", "   "] {
            assert!(
                signup(rejected).normalized().validate().is_err(),
                "'{}' should be rejected",
                rejected
            );
        }

        for accepted in ["abc", longest.as_str(), "User_Name-123"] {
            let request = signup(accepted).normalized();
            assert!(request.validate().is_ok(), "'{}' should be accepted", accepted);
            assert_eq!(request.username, accepted.to_lowercase());
        }
    }

    #[test]
    fn test_email_is_trimmed_and_lowercased() {
        let request = CreateUserRequest {
            email: "  John.Doe@Example.COM ".to_string(),
            ..signup("john")
        }
        .normalized();

        assert!(request.validate().is_ok());
        assert_eq!(request.email, "john.doe@example.com");
    }

    #[test]
    fn test_invalid_email_and_short_password_rejected() {
        let request = CreateUserRequest {
            email: "notanemail".to_string(),
            password: "short".to_string(),
            ..signup("john")
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_negative_salary_rejected() {
        let request = CreateUserRequest {
            salary: Some(Decimal::new(-1, 0)),
            ..signup("john")
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_salary_precision_rejected() {
        let request = CreateUserRequest {
            salary: Some(Decimal::new(1, 28)),
            ..signup("john")
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_salary_null_clears() {
        let clear: UpdateUserRequest = serde_json::from_str(r#"{"salary": null}"#).unwrap();
        assert_eq!(clear.salary, Some(None));
        assert!(clear.validate().is_ok());

        let untouched: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.salary, None);

        let negative: UpdateUserRequest = serde_json::from_str(r#"{"salary": "-5"}"#).unwrap();
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "john".to_string(),
            email: "john@example.com".to_string(),
            password_hash: "secret".to_string(),
            salary: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "john");
    }
}
