use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, FromRow, Postgres, Type};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::patch::deserialize_nullable;
use crate::validation::trim;

/// Color tag attached to a category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum CategoryColor {
    Blue,
    Red,
    Black,
    White,
}

impl CategoryColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryColor::Blue => "Blue",
            CategoryColor::Red => "Red",
            CategoryColor::Black => "Black",
            CategoryColor::White => "White",
        }
    }
}

impl fmt::Display for CategoryColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Blue" => Ok(CategoryColor::Blue),
            "Red" => Ok(CategoryColor::Red),
            "Black" => Ok(CategoryColor::Black),
            "White" => Ok(CategoryColor::White),
            other => Err(format!("'{}' is not a valid category color", other)),
        }
    }
}

// Stored as plain text so the column accepts TEXT or VARCHAR
impl Type<Postgres> for CategoryColor {
    fn type_info() -> PgTypeInfo {
        <str as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <str as Type<Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Postgres> for CategoryColor {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for CategoryColor {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<Postgres>>::decode(value)?;
        Ok(raw.parse::<CategoryColor>()?)
    }
}

/// Category entity grouping a user's expenses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tag: Option<CategoryColor>,
    /// The default category collects uncategorized expenses and is read-only
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Values used for the category every user gets at signup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultCategory {
    pub name: String,
    pub description: Option<String>,
    pub tag: Option<CategoryColor>,
}

impl Default for DefaultCategory {
    fn default() -> Self {
        Self {
            name: "Uncategorized".to_string(),
            description: Some("All your uncategorized expenses".to_string()),
            tag: Some(CategoryColor::Black),
        }
    }
}

impl Category {
    /// Builds the default category for a freshly created user
    pub fn default_for(user_id: Uuid, defaults: &DefaultCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: defaults.name.clone(),
            description: defaults.description.clone(),
            tag: defaults.tag,
            is_default: true,
            created_at: Utc::now(),
        }
    }
}

/// Request payload for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "groceries",
    "description": "Weekly food shopping",
    "tag": "Blue"
}))]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,

    #[validate(length(
        min = 1,
        max = 1000,
        message = "Description must be between 1 and 1000 characters"
    ))]
    pub description: Option<String>,

    pub tag: Option<CategoryColor>,
}

impl CreateCategoryRequest {
    /// Category names are unique per user regardless of case or surrounding spaces
    pub fn normalized(self) -> Self {
        Self {
            name: trim(self.name).to_lowercase(),
            description: self.description.map(trim),
            ..self
        }
    }
}

/// Request payload for updating a category. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "tag": "Red"
}))]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: Option<String>,

    #[validate(length(
        min = 1,
        max = 1000,
        message = "Description must be between 1 and 1000 characters"
    ))]
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    /// `null` removes the color tag
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<CategoryColor>)]
    pub tag: Option<Option<CategoryColor>>,
}

impl UpdateCategoryRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| trim(n).to_lowercase()),
            description: self.description.map(|d| d.map(trim)),
            ..self
        }
    }
}
