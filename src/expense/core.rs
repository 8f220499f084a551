//! Defines the core data models and database queries for expenses.

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::Date;

use crate::{Category, Error, UserId, expense::date::parse_expense_date};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// A stored expense, i.e. money a user has already spent.
///
/// Records are read-only once stored: the application never edits or deletes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRecord {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user that recorded the expense.
    pub user_id: UserId,
    /// How much was spent. Never negative, the currency is up to the user.
    pub amount: f64,
    /// What the money was spent on, [Category::Uncategorized] if it was not recorded.
    pub category: Category,
    /// When the money was spent.
    ///
    /// `None` if the stored date is missing or could not be parsed, such records cannot be
    /// placed on a timeline.
    pub date: Option<Date>,
    /// A text description of what the expense was for, may be empty.
    pub description: String,
}

/// A validated expense ready to be stored.
///
/// Build one from user input with [crate::ExpenseForm::validate], or directly with
/// [NewExpense::build] when the values are already known to be valid.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The amount spent, greater than zero.
    pub amount: f64,
    /// One of [Category::SELECTABLE].
    pub category: Category,
    /// The date the money was spent, no later than today.
    pub date: Date,
    /// Optional description, defaults to an empty string.
    pub description: String,
}

impl NewExpense {
    /// Create a new expense with an empty description.
    pub fn build(amount: f64, category: Category, date: Date) -> Self {
        Self {
            amount,
            category,
            date,
            description: String::new(),
        }
    }

    /// Set the description for the expense.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }
}

/// An expense imported verbatim from an exported snapshot.
///
/// The category and date are kept as text so that malformed values survive the import and are
/// handled the same way as malformed values written by the old client.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExpense {
    /// The amount spent.
    pub amount: f64,
    /// The category name as written in the export.
    pub category: Option<String>,
    /// The date as written in the export.
    pub date: Option<String>,
    /// The description as written in the export.
    pub description: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Store a new expense for `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_expense(
    user_id: UserId,
    expense: NewExpense,
    connection: &Connection,
) -> Result<ExpenseRecord, Error> {
    let record = connection
        .prepare(
            "INSERT INTO expense (user_id, amount, category, date, description)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, amount, category, date, description",
        )?
        .query_row(
            (
                user_id.as_i64(),
                expense.amount,
                expense.category.as_str(),
                expense.date.to_string(),
                expense.description,
            ),
            map_expense_row,
        )?;

    tracing::debug!("created expense {} for user {user_id}", record.id);

    Ok(record)
}

/// Store an imported expense for `user_id` without validating its category or date.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn insert_raw_expense(
    user_id: UserId,
    expense: RawExpense,
    connection: &Connection,
) -> Result<ExpenseId, Error> {
    connection.execute(
        "INSERT INTO expense (user_id, amount, category, date, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            user_id.as_i64(),
            expense.amount,
            expense.category,
            expense.date,
            expense.description,
        ),
    )?;

    Ok(connection.last_insert_rowid())
}

/// Get the complete set of expenses recorded by `user_id`, in the order they were stored.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_user_expenses(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<ExpenseRecord>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, amount, category, date, description FROM expense
             WHERE user_id = :user_id ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_expense_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Get the number of expenses recorded by `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn count_user_expenses(user_id: UserId, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM expense WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| {
                let count: i64 = row.get(0)?;
                u64::try_from(count)
                    .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, count))
            },
        )
        .map_err(|error| error.into())
}

/// Get the ID of the most recently stored expense of `user_id`, if they have any.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn latest_expense_id(
    user_id: UserId,
    connection: &Connection,
) -> Result<Option<ExpenseId>, Error> {
    connection
        .query_row(
            "SELECT MAX(id) FROM expense WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                category TEXT,
                date TEXT,
                description TEXT NOT NULL DEFAULT ''
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_id ON expense(user_id)",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [ExpenseRecord].
///
/// Expects the columns `id, user_id, amount, category, date, description` in that order.
fn map_expense_row(row: &Row) -> Result<ExpenseRecord, rusqlite::Error> {
    let category: Option<String> = row.get(3)?;
    let date: Option<String> = row.get(4)?;

    Ok(ExpenseRecord {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        amount: row.get(2)?,
        category: Category::from_stored(category.as_deref()),
        date: date.as_deref().and_then(parse_expense_date),
        description: row.get(5)?,
    })
}
