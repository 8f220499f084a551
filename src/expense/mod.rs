//! Expense management.
//!
//! This module contains everything related to individual expenses:
//! - The `ExpenseRecord` read model and the `NewExpense` builder
//! - Validation of the add-expense form
//! - Database functions for storing and reading a user's expenses
//! - Parsing of the date formats found in stored expenses

mod core;
mod date;
mod form;

pub use core::{
    ExpenseId, ExpenseRecord, NewExpense, RawExpense, count_user_expenses, create_expense,
    create_expense_table, get_user_expenses, insert_raw_expense, latest_expense_id,
};
pub use date::parse_expense_date;
pub use form::{ExpenseForm, parse_amount};
