//! Live recomputation of the dashboard.
//!
//! A [SnapshotSource] delivers the complete set of a user's expenses. [watch] polls the source
//! and, whenever the set changes, recomputes the dashboard from scratch and publishes the result
//! to a [LatestAggregation]. Recomputations may overlap; each one is tagged with a
//! [SnapshotVersion] and an older result never replaces a newer one.

use std::{
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use rusqlite::Connection;
use time::Date;
use tokio::{signal, sync::watch as watch_channel, time::MissedTickBehavior};

use crate::{
    AggregationResult, Error, ExpenseRecord, UserId, aggregate,
    expense::{count_user_expenses, get_user_expenses, latest_expense_id},
    timezone::local_today,
};

/// Increasing number identifying one delivered snapshot, later snapshots get larger numbers.
pub type SnapshotVersion = u64;

/// A cheap fingerprint of a user's expense set used to detect changes without loading it.
///
/// Expenses are only ever added, so the count and the newest ID change whenever the set does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSignature {
    /// Number of expenses in the set.
    pub count: u64,
    /// ID of the newest expense, `None` for an empty set.
    pub latest_id: Option<i64>,
}

/// The complete expense set of one user at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Fingerprint of `expenses`.
    pub signature: SnapshotSignature,
    /// Every expense of the user.
    pub expenses: Vec<ExpenseRecord>,
}

/// Somewhere a user's complete expense set can be read from.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Get the fingerprint of the current expense set.
    fn signature(&self) -> Result<SnapshotSignature, Error>;

    /// Load the current expense set in full.
    fn load(&self) -> Result<Snapshot, Error>;
}

/// Reads one user's expenses from the SQLite store.
#[derive(Debug, Clone)]
pub struct SqliteSnapshotSource {
    db_connection: Arc<Mutex<Connection>>,
    user_id: UserId,
}

impl SqliteSnapshotSource {
    /// Create a source for the expenses of `user_id`.
    pub fn new(db_connection: Arc<Mutex<Connection>>, user_id: UserId) -> Self {
        Self {
            db_connection,
            user_id,
        }
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let connection = self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::LockPoisoned
        })?;

        f(&connection)
    }
}

impl SnapshotSource for SqliteSnapshotSource {
    fn signature(&self) -> Result<SnapshotSignature, Error> {
        self.with_connection(|connection| {
            Ok(SnapshotSignature {
                count: count_user_expenses(self.user_id, connection)?,
                latest_id: latest_expense_id(self.user_id, connection)?,
            })
        })
    }

    fn load(&self) -> Result<Snapshot, Error> {
        self.with_connection(|connection| {
            let expenses = get_user_expenses(self.user_id, connection)?;
            let signature = SnapshotSignature {
                count: expenses.len() as u64,
                latest_id: expenses.iter().map(|expense| expense.id).max(),
            };

            Ok(Snapshot {
                signature,
                expenses,
            })
        })
    }
}

/// A dashboard result together with the snapshot it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedAggregation {
    /// The version of the snapshot the result was computed from.
    pub version: SnapshotVersion,
    /// The reference date used for the month boundaries.
    pub as_of: Date,
    /// The dashboard figures.
    pub result: AggregationResult,
}

/// Holds the dashboard result of the most recent snapshot.
///
/// Cloning gives another handle to the same result.
#[derive(Debug, Clone)]
pub struct LatestAggregation {
    sender: Arc<watch_channel::Sender<Option<PublishedAggregation>>>,
}

impl Default for LatestAggregation {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestAggregation {
    /// Create an empty holder.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(watch_channel::Sender::new(None)),
        }
    }

    /// Store `published` unless a result from a newer snapshot is already stored.
    ///
    /// Returns whether `published` was stored.
    pub fn publish(&self, published: PublishedAggregation) -> bool {
        let version = published.version;
        let stored = self.sender.send_if_modified(|current| {
            if current
                .as_ref()
                .is_some_and(|stored| stored.version > version)
            {
                return false;
            }

            *current = Some(published);
            true
        });

        if !stored {
            tracing::debug!("discarded stale dashboard result for snapshot {version}");
        }

        stored
    }

    /// The most recently stored result, if any.
    pub fn latest(&self) -> Option<PublishedAggregation> {
        self.sender.borrow().clone()
    }

    /// Get a receiver that is notified whenever a new result is stored.
    pub fn subscribe(&self) -> watch_channel::Receiver<Option<PublishedAggregation>> {
        self.sender.subscribe()
    }
}

/// Settings for [watch].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// How often to check the source for changes.
    pub poll_interval: Duration,
    /// The canonical timezone used to decide what "today" is, e.g. "Pacific/Auckland".
    pub timezone: String,
}

/// Recompute the dashboard every time the expenses in `source` change.
///
/// The source is checked every `options.poll_interval` and once immediately. Each change gets
/// the next [SnapshotVersion] and a full recomputation on a blocking thread, and the result is
/// published to `latest`. If loading a snapshot fails the error is logged and the next check
/// tries again.
///
/// Runs until `shutdown` resolves.
pub async fn watch<S, F>(
    source: Arc<S>,
    latest: LatestAggregation,
    options: WatchOptions,
    shutdown: F,
) where
    S: SnapshotSource,
    F: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(options.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let retry = Arc::new(AtomicBool::new(false));
    let mut last_signature: Option<SnapshotSignature> = None;
    let mut version: SnapshotVersion = 0;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::debug!("stopping expense watcher");
                return;
            }
            _ = interval.tick() => {}
        }

        let signature = {
            let source = source.clone();
            tokio::task::spawn_blocking(move || source.signature()).await
        };

        let signature = match signature {
            Ok(Ok(signature)) => signature,
            Ok(Err(error)) => {
                tracing::warn!("could not check expenses for changes: {error}");
                continue;
            }
            Err(error) => {
                tracing::error!("expense change check panicked: {error}");
                continue;
            }
        };

        let retrying = retry.swap(false, Ordering::SeqCst);
        if last_signature == Some(signature) && !retrying {
            continue;
        }

        last_signature = Some(signature);
        version += 1;

        tracing::info!(
            "expenses changed ({} expenses), recomputing dashboard for snapshot {version}",
            signature.count
        );

        tokio::spawn(recompute(
            source.clone(),
            latest.clone(),
            version,
            options.timezone.clone(),
            retry.clone(),
        ));
    }
}

async fn recompute<S: SnapshotSource>(
    source: Arc<S>,
    latest: LatestAggregation,
    version: SnapshotVersion,
    timezone: String,
    retry: Arc<AtomicBool>,
) {
    let computed = tokio::task::spawn_blocking(move || {
        let snapshot = source.load()?;
        let as_of = local_today(&timezone)?;
        let result = aggregate(&snapshot.expenses, as_of);

        Ok::<_, Error>(PublishedAggregation {
            version,
            as_of,
            result,
        })
    })
    .await;

    match computed {
        Ok(Ok(published)) => {
            latest.publish(published);
        }
        Ok(Err(error)) => {
            tracing::warn!("could not recompute dashboard for snapshot {version}: {error}");
            retry.store(true, Ordering::SeqCst);
        }
        Err(error) => {
            tracing::error!("dashboard recomputation for snapshot {version} panicked: {error}");
            retry.store(true, Ordering::SeqCst);
        }
    }
}

/// Waits for either the ctrl+c or terminate signal, whichever comes first.
///
/// Pass this as the `shutdown` future of [watch] to stop watching on ctrl+c.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use rusqlite::Connection;
    use time::{Date, OffsetDateTime, macros::date};
    use tokio::sync::oneshot;

    use crate::{
        Category, Error, ExpenseRecord, NewExpense, UserId, aggregate, create_expense,
        db::initialize,
    };

    use super::{
        LatestAggregation, PublishedAggregation, Snapshot, SnapshotSignature, SnapshotSource,
        SqliteSnapshotSource, WatchOptions, watch,
    };

    fn published(version: u64, total: f64) -> PublishedAggregation {
        let expenses = vec![ExpenseRecord {
            id: 1,
            user_id: UserId::new(1),
            amount: total,
            category: Category::Food,
            date: Some(date!(2025 - 03 - 01)),
            description: String::new(),
        }];

        PublishedAggregation {
            version,
            as_of: date!(2025 - 03 - 15),
            result: aggregate(&expenses, date!(2025 - 03 - 15)),
        }
    }

    #[test]
    fn newer_results_replace_older_ones() {
        let latest = LatestAggregation::new();

        assert!(latest.publish(published(1, 10.0)));
        assert!(latest.publish(published(2, 20.0)));

        let got = latest.latest().unwrap();
        assert_eq!(got.version, 2);
        assert_eq!(got.result.current_month_total, 20.0);
    }

    #[test]
    fn stale_results_are_discarded() {
        let latest = LatestAggregation::new();

        assert!(latest.publish(published(3, 30.0)));
        assert!(!latest.publish(published(2, 20.0)));

        assert_eq!(latest.latest().unwrap().version, 3);
    }

    #[test]
    fn clones_share_the_result() {
        let latest = LatestAggregation::new();
        let other = latest.clone();

        other.publish(published(1, 10.0));

        assert_eq!(latest.latest().map(|p| p.version), Some(1));
    }

    #[test]
    fn sqlite_source_signature_matches_loaded_snapshot() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = UserId::new(1);
        create_expense(
            user_id,
            NewExpense::build(5.0, Category::Food, date!(2025 - 03 - 01)),
            &conn,
        )
        .unwrap();
        create_expense(
            UserId::new(2),
            NewExpense::build(6.0, Category::Food, date!(2025 - 03 - 01)),
            &conn,
        )
        .unwrap();

        let source = SqliteSnapshotSource::new(Arc::new(Mutex::new(conn)), user_id);
        let snapshot = source.load().unwrap();

        assert_eq!(snapshot.expenses.len(), 1);
        assert_eq!(source.signature().unwrap(), snapshot.signature);
        assert_eq!(
            snapshot.signature,
            SnapshotSignature {
                count: 1,
                latest_id: Some(1)
            }
        );
    }

    /// An in-memory source whose expenses can be changed while being watched.
    #[derive(Default)]
    struct MemorySource {
        expenses: Mutex<Vec<ExpenseRecord>>,
    }

    impl MemorySource {
        fn push(&self, amount: f64, date: Date) {
            let mut expenses = self.expenses.lock().unwrap();
            let id = expenses.len() as i64 + 1;
            expenses.push(ExpenseRecord {
                id,
                user_id: UserId::new(1),
                amount,
                category: Category::Food,
                date: Some(date),
                description: String::new(),
            });
        }
    }

    impl SnapshotSource for MemorySource {
        fn signature(&self) -> Result<SnapshotSignature, Error> {
            let expenses = self.expenses.lock().map_err(|_| Error::LockPoisoned)?;
            Ok(SnapshotSignature {
                count: expenses.len() as u64,
                latest_id: expenses.last().map(|expense| expense.id),
            })
        }

        fn load(&self) -> Result<Snapshot, Error> {
            let expenses = self.expenses.lock().map_err(|_| Error::LockPoisoned)?.clone();
            Ok(Snapshot {
                signature: SnapshotSignature {
                    count: expenses.len() as u64,
                    latest_id: expenses.last().map(|expense| expense.id),
                },
                expenses,
            })
        }
    }

    #[tokio::test]
    async fn watch_recomputes_when_expenses_change() {
        let today = OffsetDateTime::now_utc().date();
        let source = Arc::new(MemorySource::default());
        source.push(10.0, today);

        let latest = LatestAggregation::new();
        let mut updates = latest.subscribe();
        let (stop, stopped) = oneshot::channel::<()>();

        let watcher = tokio::spawn(watch(
            source.clone(),
            latest.clone(),
            WatchOptions {
                poll_interval: Duration::from_millis(10),
                timezone: "UTC".to_owned(),
            },
            async move {
                let _ = stopped.await;
            },
        ));

        let first = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|published| published.is_some()),
        )
        .await
        .expect("timed out waiting for the first result")
        .unwrap()
        .clone()
        .unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(first.result.monthly_series.len(), 1);

        source.push(5.0, today);

        let second = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|published| published.as_ref().is_some_and(|p| p.version >= 2)),
        )
        .await
        .expect("timed out waiting for the second result")
        .unwrap()
        .clone()
        .unwrap();
        assert_eq!(second.result.monthly_series[0].total, 15.0);

        stop.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .expect("watcher did not stop")
            .unwrap();
    }

    /// A source with a fixed expense set whose first load fails.
    #[derive(Default)]
    struct FailsOnceSource {
        loads: AtomicUsize,
    }

    impl SnapshotSource for FailsOnceSource {
        fn signature(&self) -> Result<SnapshotSignature, Error> {
            Ok(SnapshotSignature {
                count: 0,
                latest_id: None,
            })
        }

        fn load(&self) -> Result<Snapshot, Error> {
            if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(Error::LockPoisoned);
            }

            Ok(Snapshot {
                signature: self.signature()?,
                expenses: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn failed_recomputation_is_retried_without_a_change() {
        let source = Arc::new(FailsOnceSource::default());
        let latest = LatestAggregation::new();
        let mut updates = latest.subscribe();
        let (stop, stopped) = oneshot::channel::<()>();

        let watcher = tokio::spawn(watch(
            source.clone(),
            latest.clone(),
            WatchOptions {
                poll_interval: Duration::from_millis(10),
                timezone: "UTC".to_owned(),
            },
            async move {
                let _ = stopped.await;
            },
        ));

        let published = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|published| published.is_some()),
        )
        .await
        .expect("timed out waiting for a result after the failed load")
        .unwrap()
        .clone()
        .unwrap();

        assert_eq!(published.version, 2);
        assert_eq!(published.result.current_month_total, 0.0);
        assert!(source.loads.load(Ordering::SeqCst) >= 2);

        stop.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .expect("watcher did not stop")
            .unwrap();
    }
}
