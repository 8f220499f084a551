//! Database setup for the expense store.

use rusqlite::Connection;

use crate::expense::create_expense_table;

/// Create all the application tables in the database.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    create_expense_table(connection)?;

    tracing::debug!("database initialized");

    Ok(())
}
