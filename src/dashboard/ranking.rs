//! Category ranking and percentage breakdown for the current month.

use serde::Serialize;

use crate::{Category, dashboard::aggregation::CategoryTotal};

/// How many categories the dashboard lists as top spending categories.
pub const TOP_CATEGORY_COUNT: usize = 3;

/// A category's share of the current month's spending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryShare {
    /// The category.
    pub category: Category,
    /// Spending in the category this month.
    pub amount: f64,
    /// `amount` as a percentage of the month's total, rounded to two decimal places.
    pub percentage: f64,
}

/// The categories with the highest totals, largest first.
///
/// Categories with equal totals keep the order they were first seen in.
pub(super) fn top_categories(category_totals: &[CategoryTotal]) -> Vec<CategoryTotal> {
    let mut ranked = category_totals.to_vec();
    // `sort_by` is stable, which gives the first-seen tie break.
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked.truncate(TOP_CATEGORY_COUNT);
    ranked
}

/// Each category's percentage of `month_total`.
///
/// A zero month total is treated as 1 so that every share comes out as 0%.
pub(super) fn category_breakdown(
    category_totals: &[CategoryTotal],
    month_total: f64,
) -> Vec<CategoryShare> {
    let denominator = if month_total == 0.0 { 1.0 } else { month_total };

    category_totals
        .iter()
        .map(|entry| CategoryShare {
            category: entry.category,
            amount: entry.total,
            percentage: round_to_cents(entry.total / denominator * 100.0),
        })
        .collect()
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
