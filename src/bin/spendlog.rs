use std::{
    fs::File,
    process::exit,
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::Parser;
use rusqlite::Connection;

use spendlog::{
    Error, ExpenseForm, ExpenseRecord, HistoryQuery, LatestAggregation, SqliteSnapshotSource,
    UserId, WatchOptions, aggregate,
    config::{Args, Command},
    create_expense, filter_history, format_currency, get_user_expenses, import_expenses_csv,
    initialize_db, local_today, render_dashboard, render_history, setup_logging,
    shutdown_signal, watch,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(error) = setup_logging(args.verbose, args.log_file.as_deref()) {
        eprintln!("Could not set up logging: {error}");
        exit(1);
    }

    if let Err(error) = run(args).await {
        tracing::debug!("command failed: {error:?}");
        eprintln!("{}", error.user_message());
        exit(1);
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let user_id = UserId::new(args.user_id);
    let mut connection = Connection::open(&args.db_path)?;
    initialize_db(&connection)?;

    tracing::debug!("opened database at {:?}", args.db_path);

    match args.command {
        Command::Add {
            amount,
            category,
            date,
            description,
        } => {
            let today = local_today(&args.timezone)?;
            let form = ExpenseForm {
                amount,
                category,
                date: date.unwrap_or(today),
                description,
            };

            let expense = create_expense(user_id, form.validate(today)?, &connection)?;
            println!(
                "Added {} expense of {} on {}",
                expense.category,
                format_currency(expense.amount),
                display_date(&expense)
            );
        }
        Command::Import { path } => {
            let file = File::open(&path)?;
            let summary = import_expenses_csv(file, user_id, &mut connection)?;
            println!(
                "Imported {} expenses, skipped {}",
                summary.imported, summary.skipped
            );
        }
        Command::Dashboard { as_of, json } => {
            let as_of = match as_of {
                Some(as_of) => as_of,
                None => local_today(&args.timezone)?,
            };
            let expenses = get_user_expenses(user_id, &connection)?;
            let result = aggregate(&expenses, as_of);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_dashboard(&result));
            }
        }
        Command::History {
            category,
            search,
            sort,
            json,
        } => {
            let expenses = get_user_expenses(user_id, &connection)?;
            let query = HistoryQuery {
                category,
                search,
                sort,
            };
            let history = filter_history(&expenses, &query);

            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                print!("{}", render_history(&history));
            }
        }
        Command::Watch { interval_secs } => {
            // Fail early on a bad timezone rather than on every recomputation.
            local_today(&args.timezone)?;

            let source = Arc::new(SqliteSnapshotSource::new(
                Arc::new(Mutex::new(connection)),
                user_id,
            ));
            let latest = LatestAggregation::new();
            let mut updates = latest.subscribe();

            let printer = tokio::spawn(async move {
                while updates.changed().await.is_ok() {
                    let published = updates.borrow_and_update().clone();
                    if let Some(published) = published {
                        println!(
                            "--- Snapshot {} as of {} ---",
                            published.version, published.as_of
                        );
                        print!("{}", render_dashboard(&published.result));
                    }
                }
            });

            watch(
                source,
                latest,
                WatchOptions {
                    poll_interval: Duration::from_secs(interval_secs.max(1)),
                    timezone: args.timezone,
                },
                shutdown_signal(),
            )
            .await;

            printer.abort();
        }
    }

    Ok(())
}

fn display_date(expense: &ExpenseRecord) -> String {
    expense
        .date
        .map(|date| date.to_string())
        .unwrap_or_else(|| "an unknown date".to_owned())
}
