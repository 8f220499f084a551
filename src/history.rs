//! The expense history view: filtering, searching and sorting a user's expenses.

use std::cmp::Ordering;

use crate::{Category, ExpenseRecord};

/// The order to list expenses in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum HistorySort {
    /// Newest first. Expenses without a date are listed last.
    #[default]
    Date,
    /// Largest amount first.
    Amount,
}

/// Which expenses to show and in what order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    /// Only show expenses in this category, `None` shows all categories.
    pub category: Option<Category>,
    /// Only show expenses whose description contains this text, ignoring case.
    pub search: Option<String>,
    /// The order to list the matching expenses in.
    pub sort: HistorySort,
}

/// Select and order the expenses matching `query`.
///
/// Expenses that compare equal under the chosen sort keep their original order.
pub fn filter_history<'a>(
    expenses: &'a [ExpenseRecord],
    query: &HistoryQuery,
) -> Vec<&'a ExpenseRecord> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|search| !search.is_empty())
        .map(str::to_lowercase);

    let mut matching: Vec<&ExpenseRecord> = expenses
        .iter()
        .filter(|expense| {
            query
                .category
                .is_none_or(|category| expense.category == category)
        })
        .filter(|expense| {
            search
                .as_deref()
                .is_none_or(|search| expense.description.to_lowercase().contains(search))
        })
        .collect();

    match query.sort {
        HistorySort::Date => matching.sort_by(|a, b| newest_first(a, b)),
        HistorySort::Amount => matching.sort_by(|a, b| b.amount.total_cmp(&a.amount)),
    }

    matching
}

fn newest_first(a: &ExpenseRecord, b: &ExpenseRecord) -> Ordering {
    match (a.date, b.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
