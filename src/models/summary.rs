use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::category::CategoryColor;

/// Spending aggregated over one category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, PartialEq)]
pub struct CategorySpending {
    pub category_id: Uuid,
    pub name: String,
    pub tag: Option<CategoryColor>,
    pub total: Decimal,
    pub expense_count: i64,
}

/// Dashboard view of a user's spending against their salary
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpendingSummary {
    pub salary: Option<Decimal>,
    pub total_spent: Decimal,
    /// Salary minus total spent, negative when overspent
    pub remaining: Decimal,
    /// Share of the salary already spent, absent without a positive salary
    pub spent_percentage: Option<Decimal>,
    pub expense_count: i64,
    pub categories: Vec<CategorySpending>,
}

/// A summary figure fell outside the range `Decimal` can represent
#[derive(Debug, Error, PartialEq)]
#[error("spending summary overflowed")]
pub struct SummaryOverflow;

impl SpendingSummary {
    /// Folds per-category totals into the dashboard figures
    pub fn from_categories(
        salary: Option<Decimal>,
        mut categories: Vec<CategorySpending>,
    ) -> Result<Self, SummaryOverflow> {
        let total_spent = categories
            .iter()
            .try_fold(Decimal::ZERO, |acc, c| acc.checked_add(c.total))
            .ok_or(SummaryOverflow)?;
        let expense_count = categories.iter().map(|c| c.expense_count).sum();

        let remaining = salary
            .unwrap_or(Decimal::ZERO)
            .checked_sub(total_spent)
            .ok_or(SummaryOverflow)?;
        let spent_percentage = match salary.filter(|s| *s > Decimal::ZERO) {
            Some(s) => Some(
                total_spent
                    .checked_div(s)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or(SummaryOverflow)?
                    .round_dp(2),
            ),
            None => None,
        };

        categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        for category in &mut categories {
            category.total = category.total.round_dp(2);
        }

        Ok(Self {
            salary,
            total_spent: total_spent.round_dp(2),
            remaining: remaining.round_dp(2),
            spent_percentage,
            expense_count,
            categories,
        })
    }
}
