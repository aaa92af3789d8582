use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::patch::deserialize_nullable;
use crate::validation::{trim, validate_money};

/// Expense entity representing a single spending record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request payload for creating an expense
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Weekly groceries",
    "amount": "42.50",
    "description": "Farmers market",
    "category_id": "550e8400-e29b-41d4-a716-446655440000"
}))]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_money"))]
    #[schema(example = "42.50")]
    pub amount: Decimal,

    #[validate(length(
        min = 1,
        max = 1000,
        message = "Description must be between 1 and 1000 characters"
    ))]
    pub description: Option<String>,

    /// Falls back to the user's default category when omitted
    pub category_id: Option<Uuid>,
}

impl CreateExpenseRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: trim(self.name),
            description: self.description.map(trim),
            ..self
        }
    }
}

/// Request payload for updating an expense. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "amount": "45.00"
}))]
pub struct UpdateExpenseRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_money"))]
    pub amount: Option<Decimal>,

    /// `null` clears the description
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Description must be between 1 and 1000 characters"
    ))]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    pub category_id: Option<Uuid>,
}

impl UpdateExpenseRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(trim),
            description: self.description.map(|d| d.map(trim)),
            ..self
        }
    }
}
