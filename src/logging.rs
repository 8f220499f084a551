//! Logging setup for the command line application.

use std::{fs::OpenOptions, path::Path, sync::Arc};

use tracing_subscriber::{
    EnvFilter, Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::Error;

/// Install the global tracing subscriber.
///
/// Log events go to stderr so that they never mix with report output on stdout. The level is
/// taken from `RUST_LOG` if set, otherwise from `verbosity`: 0 is `info`, 1 is `debug` and 2 or
/// more is `trace`.
///
/// If `log_file` is given, every event at `debug` level and above is also appended to that file.
///
/// # Errors
/// Returns an [Error::Io] if the log file cannot be opened.
pub fn setup_logging(verbosity: u8, log_file: Option<&Path>) -> Result<(), Error> {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_log = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let debug_log = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(filter::LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(debug_log)
        .init();

    Ok(())
}
