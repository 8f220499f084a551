//! Import of expense snapshots exported as CSV.
//!
//! The export has the columns `amount,category,date,description`. Other columns are ignored and
//! the category, date and description cells may be empty.

use std::io::Read;

use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    Error, UserId,
    expense::{RawExpense, insert_raw_expense, parse_amount},
};

/// The outcome of importing a CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    /// How many expenses were stored.
    pub imported: usize,
    /// How many rows were skipped because the amount was not a valid, non-negative number.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    amount: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Import the expenses in a CSV export for `user_id`.
///
/// Categories and dates are stored as written, so a malformed date stays malformed and is later
/// left out of the dashboard. All rows are stored in one database transaction: either the whole
/// file is imported or nothing is.
///
/// # Errors
/// Returns an [Error::InvalidCsv] if the CSV cannot be parsed (e.g., the `amount` column is
/// missing), or an [Error::SqlError] if there is an SQL error.
pub fn import_expenses_csv<R: Read>(
    reader: R,
    user_id: UserId,
    connection: &mut Connection,
) -> Result<ImportSummary, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let transaction = connection.transaction()?;
    let mut summary = ImportSummary::default();

    for (index, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // Line 1 is the header.
        let line_number = index + 2;
        let row = row.map_err(|error| {
            Error::InvalidCsv(format!("could not read line {line_number}: {error}"))
        })?;

        let amount = match parse_amount(&row.amount) {
            Some(amount) if amount >= 0.0 => amount,
            _ => {
                tracing::warn!(
                    "skipping line {line_number}: invalid amount {:?}",
                    row.amount
                );
                summary.skipped += 1;
                continue;
            }
        };

        insert_raw_expense(
            user_id,
            RawExpense {
                amount,
                category: row.category,
                date: row.date,
                description: row.description.unwrap_or_default(),
            },
            &transaction,
        )?;
        summary.imported += 1;
    }

    transaction.commit()?;

    tracing::info!(
        "imported {} expenses for user {user_id}, skipped {}",
        summary.imported,
        summary.skipped
    );

    Ok(summary)
}
