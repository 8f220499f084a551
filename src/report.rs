//! Plain-text rendering of the dashboard and the expense history.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::Month;

use crate::{AggregationResult, Comparison, ExpenseRecord};

/// Format an amount of money with a dollar sign, thousands separators and two decimal places.
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    let formatted_string = match (positive_fmt, negative_fmt) {
        _ if number == 0.0 => {
            // Zero is hardcoded as "0", so we must specify the formatted string for zero
            return "$0.00".to_owned();
        }
        (Some(positive_fmt), _) if number > 0.0 => positive_fmt.fmt_string(number),
        (_, Some(negative_fmt)) if number < 0.0 => negative_fmt.fmt_string(number.abs()),
        _ => return format!("${number:.2}"),
    };

    // numfmt omits trailing zeros, so we must add them ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    match formatted_string.rfind('.') {
        None => format!("{formatted_string}.00"),
        Some(position) if formatted_string.len() - position == 2 => {
            format!("{formatted_string}0")
        }
        Some(_) => formatted_string,
    }
}

/// Format a calendar month as a three-letter abbreviation and year, e.g. "Feb 2025".
pub fn format_month_label(year: i32, month: u8) -> String {
    let name = match Month::try_from(month) {
        Ok(Month::January) => "Jan",
        Ok(Month::February) => "Feb",
        Ok(Month::March) => "Mar",
        Ok(Month::April) => "Apr",
        Ok(Month::May) => "May",
        Ok(Month::June) => "Jun",
        Ok(Month::July) => "Jul",
        Ok(Month::August) => "Aug",
        Ok(Month::September) => "Sep",
        Ok(Month::October) => "Oct",
        Ok(Month::November) => "Nov",
        Ok(Month::December) => "Dec",
        Err(_) => "???",
    };

    format!("{name} {year}")
}

fn comparison_line(result: &AggregationResult) -> String {
    match (result.comparison, result.previous_month_total) {
        (Some(Comparison::Up), Some(previous)) => {
            format!("Up from {} last month", format_currency(previous))
        }
        (Some(Comparison::Down), Some(previous)) => {
            format!("Down from {} last month", format_currency(previous))
        }
        _ => "No data for last month".to_owned(),
    }
}

/// Render the dashboard figures as text for a terminal.
pub fn render_dashboard(result: &AggregationResult) -> String {
    let mut lines = vec![
        format!("This month: {}", format_currency(result.current_month_total)),
        comparison_line(result),
        String::new(),
        "Top categories:".to_owned(),
    ];

    if result.top_categories.is_empty() {
        lines.push("  No expenses this month".to_owned());
    }
    lines.extend(result.top_categories.iter().enumerate().map(|(rank, entry)| {
        format!(
            "  {}. {:<15} {:>14}",
            rank + 1,
            entry.category.as_str(),
            format_currency(entry.total)
        )
    }));

    if !result.category_breakdown.is_empty() {
        lines.push(String::new());
        lines.push("Breakdown:".to_owned());
        lines.extend(result.category_breakdown.iter().map(|share| {
            format!(
                "  {:<15} {:>14} {:>7.2}%",
                share.category.as_str(),
                format_currency(share.amount),
                share.percentage
            )
        }));
    }

    lines.push(String::new());
    lines.push("Monthly trend:".to_owned());
    if result.monthly_series.is_empty() {
        lines.push("  No expenses yet".to_owned());
    }
    lines.extend(result.monthly_series.iter().map(|entry| {
        format!(
            "  {:<10} {:>14}",
            format_month_label(entry.year, entry.month),
            format_currency(entry.total)
        )
    }));

    to_text(lines)
}

/// Render a list of expenses as text for a terminal, one expense per line.
pub fn render_history(expenses: &[&ExpenseRecord]) -> String {
    if expenses.is_empty() {
        return "No expenses found\n".to_owned();
    }

    let lines = expenses.iter().map(|expense| {
        let date = expense
            .date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "unknown date".to_owned());

        format!(
            "{date:<12} {:<15} {:>14}  {}",
            expense.category.as_str(),
            format_currency(expense.amount),
            expense.description
        )
    });

    to_text(lines)
}

/// Join lines into text where every line, including the last, ends with a newline.
fn to_text(lines: impl IntoIterator<Item = String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}
