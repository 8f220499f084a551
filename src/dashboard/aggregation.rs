//! Expense aggregation for the home dashboard.
//!
//! Buckets a snapshot of expenses into the current month, the previous month and one bucket per
//! calendar month, then derives the comparison, category ranking and trend series from those
//! buckets. The snapshot is always processed in full.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration};

use crate::{
    Category, ExpenseRecord,
    dashboard::ranking::{CategoryShare, category_breakdown, top_categories},
};

/// Expenses of this amount or more are left out of the current month figures.
///
/// Such amounts are almost always typos (e.g. a missing decimal point) and would swamp the
/// dashboard. They still count towards the previous month and the trend series.
pub const OUTLIER_CAP: f64 = 1_000_000.0;

/// Total spending in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthTotal {
    /// The calendar year.
    pub year: i32,
    /// The month number, 1 for January to 12 for December.
    pub month: u8,
    /// Sum of all expenses dated in this month.
    pub total: f64,
}

/// Total current month spending in one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category.
    pub category: Category,
    /// Sum of the current month expenses in the category.
    pub total: f64,
}

/// Whether spending went up or down compared to the previous month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// This month's spending is higher than last month's.
    Up,
    /// This month's spending is the same as or lower than last month's.
    Down,
}

/// The dashboard figures for one expense snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    /// Spending from the first of the month up to and including the reference date.
    pub current_month_total: f64,
    /// Spending in the previous calendar month, `None` if there was none.
    pub previous_month_total: Option<f64>,
    /// Current month totals per category, in the order the categories were first seen.
    pub category_totals: Vec<CategoryTotal>,
    /// One total per calendar month with expenses, earliest month first.
    pub monthly_series: Vec<MonthTotal>,
    /// Up to [crate::TOP_CATEGORY_COUNT] categories with the highest current month spending.
    pub top_categories: Vec<CategoryTotal>,
    /// Each category's share of the current month total.
    pub category_breakdown: Vec<CategoryShare>,
    /// `None` when there is no previous month spending to compare against.
    pub comparison: Option<Comparison>,
}

impl AggregationResult {
    /// Whether there was any spending in the previous month.
    ///
    /// When this is false the dashboard shows "no data for last month" rather than a comparison.
    pub fn has_previous_month_data(&self) -> bool {
        self.previous_month_total.is_some()
    }

    /// The current month total for `category`, `None` if nothing was spent in it.
    pub fn category_total(&self, category: Category) -> Option<f64> {
        self.category_totals
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.total)
    }
}

/// The date windows used to bucket expenses, relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MonthWindows {
    current_start: Date,
    as_of: Date,
    /// `None` only when the reference date is in the earliest representable month.
    previous: Option<(Date, Date)>,
}

impl MonthWindows {
    fn new(as_of: Date) -> Self {
        let current_start = first_of_month(as_of);
        let previous = current_start
            .previous_day()
            .map(|previous_end| (first_of_month(previous_end), previous_end));

        Self {
            current_start,
            as_of,
            previous,
        }
    }

    fn in_current_month(&self, date: Date) -> bool {
        self.current_start <= date && date <= self.as_of
    }

    fn in_previous_month(&self, date: Date) -> bool {
        self.previous
            .is_some_and(|(start, end)| start <= date && date <= end)
    }
}

fn first_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

fn month_key(date: Date) -> (i32, u8) {
    (date.year(), u8::from(date.month()))
}

/// Compute the dashboard figures for a user's expenses.
///
/// `expenses` must already be limited to a single user. `as_of` is the reference "today" that
/// decides the month boundaries, pass it explicitly so the result only depends on the inputs.
///
/// Expenses without a date cannot be placed in a month and are skipped. This never fails and
/// never modifies `expenses`.
pub fn aggregate(expenses: &[ExpenseRecord], as_of: Date) -> AggregationResult {
    let windows = MonthWindows::new(as_of);

    let mut current_month_total = 0.0;
    let mut previous_month_total = 0.0;
    let mut category_totals: Vec<CategoryTotal> = Vec::new();
    let mut monthly_totals: BTreeMap<(i32, u8), f64> = BTreeMap::new();
    let mut skipped = 0usize;

    for expense in expenses {
        let Some(date) = expense.date else {
            tracing::trace!("skipping expense {} without a valid date", expense.id);
            skipped += 1;
            continue;
        };

        if windows.in_current_month(date) && expense.amount < OUTLIER_CAP {
            current_month_total += expense.amount;
            add_to_category(&mut category_totals, expense.category, expense.amount);
        }

        if windows.in_previous_month(date) {
            previous_month_total += expense.amount;
        }

        *monthly_totals.entry(month_key(date)).or_insert(0.0) += expense.amount;
    }

    let monthly_series = monthly_totals
        .into_iter()
        .map(|((year, month), total)| MonthTotal { year, month, total })
        .collect();

    let (previous_month_total, comparison) = if previous_month_total > 0.0 {
        let comparison = if current_month_total > previous_month_total {
            Comparison::Up
        } else {
            Comparison::Down
        };
        (Some(previous_month_total), Some(comparison))
    } else {
        (None, None)
    };

    tracing::debug!(
        "aggregated {} expenses as of {as_of} ({skipped} without a date)",
        expenses.len()
    );

    AggregationResult {
        current_month_total,
        previous_month_total,
        top_categories: top_categories(&category_totals),
        category_breakdown: category_breakdown(&category_totals, current_month_total),
        category_totals,
        monthly_series,
        comparison,
    }
}

fn add_to_category(totals: &mut Vec<CategoryTotal>, category: Category, amount: f64) {
    match totals.iter_mut().find(|entry| entry.category == category) {
        Some(entry) => entry.total += amount,
        None => totals.push(CategoryTotal {
            category,
            total: amount,
        }),
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{Category, ExpenseRecord, UserId};

    use super::{Comparison, MonthTotal, MonthWindows, OUTLIER_CAP, aggregate};

    const AS_OF: Date = date!(2025 - 03 - 15);

    fn expense(amount: f64, category: Category, date: Option<Date>) -> ExpenseRecord {
        ExpenseRecord {
            id: 0,
            user_id: UserId::new(1),
            amount,
            category,
            date,
            description: String::new(),
        }
    }

    #[test]
    fn month_windows_handle_year_boundary() {
        let windows = MonthWindows::new(date!(2025 - 01 - 10));

        assert_eq!(windows.current_start, date!(2025 - 01 - 01));
        assert_eq!(
            windows.previous,
            Some((date!(2024 - 12 - 01), date!(2024 - 12 - 31)))
        );
    }

    #[test]
    fn month_windows_handle_leap_february() {
        let windows = MonthWindows::new(date!(2024 - 03 - 31));

        assert_eq!(
            windows.previous,
            Some((date!(2024 - 02 - 01), date!(2024 - 02 - 29)))
        );
    }

    #[test]
    fn outliers_are_left_out_of_current_month() {
        let expenses = vec![
            expense(100.0, Category::Food, Some(date!(2025 - 03 - 01))),
            expense(50.0, Category::Food, Some(date!(2025 - 03 - 02))),
            expense(2_000_000.0, Category::Rent, Some(date!(2025 - 03 - 03))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.current_month_total, 150.0);
        assert_eq!(result.category_total(Category::Food), Some(150.0));
        assert_eq!(result.category_total(Category::Rent), None);
        assert_eq!(result.category_totals.len(), 1);
        // The outlier still shows up in the trend.
        assert_eq!(
            result.monthly_series,
            vec![MonthTotal {
                year: 2025,
                month: 3,
                total: 2_000_150.0
            }]
        );
    }

    #[test]
    fn outlier_cap_is_inclusive() {
        let expenses = vec![
            expense(999_999.99, Category::Food, Some(date!(2025 - 03 - 01))),
            expense(OUTLIER_CAP, Category::Rent, Some(date!(2025 - 03 - 02))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.current_month_total, 999_999.99);
        assert_eq!(result.category_total(Category::Food), Some(999_999.99));
        assert_eq!(result.category_total(Category::Rent), None);
    }

    #[test]
    fn outliers_still_count_for_previous_month() {
        let expenses = vec![
            expense(10.0, Category::Food, Some(date!(2025 - 03 - 01))),
            expense(1_500_000.0, Category::Rent, Some(date!(2025 - 02 - 10))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.previous_month_total, Some(1_500_000.0));
        assert_eq!(result.comparison, Some(Comparison::Down));
    }

    #[test]
    fn no_previous_month_data_means_no_comparison() {
        let expenses = vec![
            expense(10.0, Category::Food, Some(date!(2025 - 03 - 01))),
            expense(20.0, Category::Bills, Some(date!(2025 - 03 - 02))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.previous_month_total, None);
        assert_eq!(result.comparison, None);
        assert!(!result.has_previous_month_data());
    }

    #[test]
    fn older_months_do_not_count_as_previous_month() {
        let expenses = vec![
            expense(10.0, Category::Food, Some(date!(2025 - 03 - 01))),
            expense(20.0, Category::Food, Some(date!(2025 - 01 - 31))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.previous_month_total, None);
        assert_eq!(result.comparison, None);
    }

    #[test]
    fn comparison_is_up_when_spending_increased() {
        let expenses = vec![
            expense(80.0, Category::Food, Some(date!(2025 - 03 - 05))),
            expense(50.0, Category::Food, Some(date!(2025 - 02 - 28))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.previous_month_total, Some(50.0));
        assert_eq!(result.comparison, Some(Comparison::Up));
    }

    #[test]
    fn comparison_is_down_when_spending_is_equal() {
        let expenses = vec![
            expense(50.0, Category::Food, Some(date!(2025 - 03 - 05))),
            expense(50.0, Category::Food, Some(date!(2025 - 02 - 01))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.comparison, Some(Comparison::Down));
    }

    #[test]
    fn expenses_after_reference_date_are_not_in_current_month() {
        let expenses = vec![
            expense(10.0, Category::Food, Some(date!(2025 - 03 - 15))),
            expense(99.0, Category::Food, Some(date!(2025 - 03 - 16))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.current_month_total, 10.0);
        assert_eq!(result.monthly_series[0].total, 109.0);
    }

    #[test]
    fn undated_expenses_are_skipped() {
        let expenses = vec![
            expense(10.0, Category::Food, None),
            expense(5.0, Category::Food, Some(date!(2025 - 03 - 01))),
        ];

        let result = aggregate(&expenses, AS_OF);

        assert_eq!(result.current_month_total, 5.0);
        assert_eq!(result.monthly_series.len(), 1);
        assert_eq!(result.monthly_series[0].total, 5.0);
    }

    #[test]
    fn monthly_series_is_chronological() {
        // "11/2024" sorts before "2/2025" as text, but also before it in time, while "2/2025"
        // must come before "11/2025".
        let expenses = vec![
            expense(1.0, Category::Food, Some(date!(2025 - 11 - 03))),
            expense(2.0, Category::Food, Some(date!(2025 - 02 - 03))),
            expense(3.0, Category::Food, Some(date!(2024 - 11 - 03))),
            expense(4.0, Category::Food, Some(date!(2025 - 02 - 20))),
        ];

        let result = aggregate(&expenses, date!(2025 - 11 - 30));

        let months: Vec<(i32, u8, f64)> = result
            .monthly_series
            .iter()
            .map(|entry| (entry.year, entry.month, entry.total))
            .collect();
        assert_eq!(
            months,
            vec![(2024, 11, 3.0), (2025, 2, 6.0), (2025, 11, 1.0)]
        );
    }

    #[test]
    fn category_totals_sum_to_current_month_total() {
        let expenses = vec![
            expense(12.5, Category::Food, Some(date!(2025 - 03 - 01))),
            expense(40.0, Category::Transportation, Some(date!(2025 - 03 - 02))),
            expense(7.25, Category::Uncategorized, Some(date!(2025 - 03 - 03))),
            expense(3.0, Category::Food, Some(date!(2025 - 03 - 04))),
            expense(100.0, Category::Rent, Some(date!(2025 - 02 - 04))),
        ];

        let result = aggregate(&expenses, AS_OF);

        let sum: f64 = result.category_totals.iter().map(|entry| entry.total).sum();
        assert_eq!(sum, result.current_month_total);
        assert_eq!(result.category_total(Category::Uncategorized), Some(7.25));
    }

    #[test]
    fn empty_snapshot_gives_empty_result() {
        let result = aggregate(&[], AS_OF);

        assert_eq!(result.current_month_total, 0.0);
        assert_eq!(result.previous_month_total, None);
        assert!(result.category_totals.is_empty());
        assert!(result.monthly_series.is_empty());
        assert!(result.top_categories.is_empty());
        assert!(result.category_breakdown.is_empty());
        assert_eq!(result.comparison, None);
    }

    #[test]
    fn aggregate_does_not_modify_input() {
        let expenses = vec![
            expense(3.0, Category::Food, Some(date!(2025 - 03 - 03))),
            expense(1.0, Category::Food, None),
        ];
        let before = expenses.clone();

        let _ = aggregate(&expenses, AS_OF);

        assert_eq!(expenses, before);
    }
}
