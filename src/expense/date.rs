//! Parsing of stored expense dates.
//!
//! New expenses are stored as ISO-8601 dates, but snapshots exported from the old mobile
//! client hold US locale dates like `3/7/2025`. Both are accepted.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

const ISO_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const US_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[month padding:none]/[day padding:none]/[year]");

/// Parse the date of a stored expense.
///
/// Accepts `YYYY-MM-DD` and `M/D/YYYY` (leading zeros optional). Returns `None` for anything
/// else, including calendar dates that do not exist such as `2/30/2025`.
pub fn parse_expense_date(text: &str) -> Option<Date> {
    let text = text.trim();

    let format = if text.contains('/') {
        US_DATE_FORMAT
    } else {
        ISO_DATE_FORMAT
    };

    Date::parse(text, &format).ok()
}
