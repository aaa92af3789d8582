use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

pub const DEFAULT_LIMIT: u32 = 5;
pub const MAX_LIMIT: u32 = 100;

/// `?limit=&offset=` query parameters for list endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, IntoParams, PartialEq, Eq)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Maximum number of items to return (at most 100)
    #[serde(default = "default_limit")]
    #[validate(range(max = 100, message = "limit must be at most 100"))]
    #[param(default = 5, maximum = 100)]
    pub limit: u32,

    /// Number of items to skip
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Applies the window to an already ordered iterator
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}
