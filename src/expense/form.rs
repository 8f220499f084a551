//! Validation of the add-expense form.

use time::Date;

use crate::{Category, Error, expense::NewExpense};

/// The form data for creating an expense, as entered by the user.
#[derive(Debug, Clone)]
pub struct ExpenseForm {
    /// The amount as typed, may contain thousands separators, e.g. "1,250.00".
    pub amount: String,
    /// The selected category name, `None` if nothing was selected.
    pub category: Option<String>,
    /// The date the money was spent.
    pub date: Date,
    /// Text detailing the expense.
    pub description: String,
}

impl ExpenseForm {
    /// Check the form and turn it into an expense that can be stored.
    ///
    /// `today` is the current date in the user's timezone.
    ///
    /// # Errors
    /// Returns the first problem found, checked in this order:
    /// - [Error::FutureDate] if the date is after `today`,
    /// - [Error::InvalidAmount] if the amount is not a number greater than zero,
    /// - [Error::MissingCategory] if no category was selected,
    /// - [Error::InvalidCategory] if the category is not selectable.
    pub fn validate(self, today: Date) -> Result<NewExpense, Error> {
        if self.date > today {
            tracing::debug!("rejected expense dated {} after today {today}", self.date);
            return Err(Error::FutureDate(self.date));
        }

        let amount = match parse_amount(&self.amount) {
            Some(amount) if amount > 0.0 => amount,
            _ => return Err(Error::InvalidAmount(self.amount)),
        };

        let category: Category = self.category.as_deref().unwrap_or_default().parse()?;

        Ok(NewExpense::build(amount, category, self.date).description(self.description.trim()))
    }
}

/// Parse an amount typed by a user or found in an export.
///
/// Thousands separators are ignored. Returns `None` if the text is not a finite number.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}
