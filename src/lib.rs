//! Spendlog is a personal expense tracker.
//!
//! This library records expenses for a user, validates new expenses entered
//! through a form, and turns a user's expense snapshot into the figures shown
//! on the home dashboard: this month's spending, last month's spending, a
//! per-category breakdown and a month-by-month trend.

#![warn(missing_docs)]

use time::Date;

mod category;
mod csv_import;
mod dashboard;
mod db;
mod expense;
mod history;
mod logging;
mod report;
mod snapshot;
mod timezone;
mod user;

pub mod config;

pub use category::Category;
pub use csv_import::{ImportSummary, import_expenses_csv};
pub use dashboard::{
    AggregationResult, CategoryShare, CategoryTotal, Comparison, MonthTotal, OUTLIER_CAP,
    TOP_CATEGORY_COUNT, aggregate,
};
pub use db::initialize as initialize_db;
pub use expense::{
    ExpenseForm, ExpenseId, ExpenseRecord, NewExpense, RawExpense, count_user_expenses,
    create_expense, get_user_expenses, insert_raw_expense, latest_expense_id, parse_expense_date,
};
pub use history::{HistoryQuery, HistorySort, filter_history};
pub use logging::setup_logging;
pub use report::{format_currency, format_month_label, render_dashboard, render_history};
pub use snapshot::{
    LatestAggregation, PublishedAggregation, Snapshot, SnapshotSignature, SnapshotSource,
    SnapshotVersion, SqliteSnapshotSource, WatchOptions, shutdown_signal, watch,
};
pub use timezone::{get_local_offset, local_today};
pub use user::UserId;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A date in the future was used to create an expense.
    ///
    /// Expenses record spending that has already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The amount was not a number, or was zero or negative.
    ///
    /// Holds the text the user entered.
    #[error("\"{0}\" is not a valid expense amount")]
    InvalidAmount(String),

    /// No category was selected for a new expense.
    #[error("no category was selected")]
    MissingCategory,

    /// The category name does not match any selectable category.
    #[error("\"{0}\" is not a valid category")]
    InvalidCategory(String),

    /// The CSV had issues that prevented it from being parsed.
    #[error("could not parse the CSV file: {0}")]
    InvalidCsv(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A thread panicked while holding a shared lock.
    #[error("could not acquire a lock that was poisoned by a panic")]
    LockPoisoned,

    /// A timezone name did not match a canonical timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A value could not be serialized as JSON.
    #[error("could not serialize as JSON: {0}")]
    Json(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Json(value.to_string())
    }
}

impl Error {
    /// The message to show the person who submitted the expense form.
    ///
    /// Errors that are not caused by user input get a generic message, the
    /// details of those belong in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::FutureDate(_) => "The date cannot be in the future.".to_owned(),
            Error::InvalidAmount(_) => "Please enter a valid amount.".to_owned(),
            Error::MissingCategory => "Please select a category.".to_owned(),
            Error::InvalidCategory(name) => format!(
                "\"{name}\" is not a category. Choose one of: {}.",
                Category::SELECTABLE
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Error::InvalidCsv(reason) => format!("Could not import the CSV file: {reason}"),
            Error::InvalidTimezone(timezone) => format!(
                "Could not get local timezone \"{timezone}\". Use a canonical timezone name \
                such as \"Pacific/Auckland\"."
            ),
            Error::Io(reason) => format!("Could not read or write a file: {reason}"),
            _ => "Something went wrong, check the logs for more details.".to_owned(),
        }
    }
}
