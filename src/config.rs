//! Command line configuration for the spendlog binary.
//!
//! Global options can also be set through environment variables so that a user does not have to
//! repeat them for every command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use time::Date;

use crate::{Category, HistorySort};

/// Track your spending from the command line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "SPENDLOG_DB", default_value = "spendlog.db")]
    pub db_path: PathBuf,

    /// The ID of the user whose expenses to work with.
    #[arg(long, env = "SPENDLOG_USER", default_value_t = 1)]
    pub user_id: i64,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    #[arg(long, env = "SPENDLOG_TIMEZONE", default_value = "UTC")]
    pub timezone: String,

    /// Also write debug logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log more detail, repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// The actions the binary can perform.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a new expense.
    Add {
        /// How much was spent, e.g. "12.50" or "1,200".
        amount: String,

        /// What the money was spent on.
        #[arg(short, long)]
        category: Option<String>,

        /// When the money was spent (YYYY-MM-DD), defaults to today.
        #[arg(short, long, value_parser = parse_date_arg)]
        date: Option<Date>,

        /// What the expense was for.
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Import expenses from a CSV export with the columns amount,category,date,description.
    Import {
        /// The CSV file to import.
        path: PathBuf,
    },

    /// Show this month's spending, the comparison with last month and the monthly trend.
    Dashboard {
        /// The reference date for the month boundaries (YYYY-MM-DD), defaults to today.
        #[arg(long, value_parser = parse_date_arg)]
        as_of: Option<Date>,

        /// Print the figures as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List past expenses.
    History {
        /// Only show expenses in this category.
        #[arg(short, long, value_parser = parse_category_arg)]
        category: Option<Category>,

        /// Only show expenses whose description contains this text.
        #[arg(short, long)]
        search: Option<String>,

        /// The order to list expenses in.
        #[arg(long, value_enum, default_value_t = HistorySort::Date)]
        sort: HistorySort,

        /// Print the expenses as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep the dashboard up to date as expenses are added, until ctrl+c is pressed.
    Watch {
        /// How often to check for new expenses, in seconds.
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
    },
}

fn parse_date_arg(text: &str) -> Result<Date, String> {
    crate::parse_expense_date(text).ok_or_else(|| format!("\"{text}\" is not a valid date"))
}

fn parse_category_arg(text: &str) -> Result<Category, String> {
    text.parse().map_err(|error: crate::Error| error.to_string())
}
