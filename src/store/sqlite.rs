//! SQLite-backed telemetry store
//!
//! Owns a fixed pool of read-only connections. Queries run on the blocking
//! thread pool and are bounded by a timeout.
//!
//! # Pooling
//!
//! ```text
//! request ─▶ next() % N ─▶ Mutex<Connection> ─▶ prepare_cached ─▶ scan all rows
//! ```
//!
//! Connections are handed out round-robin. A request whose connection is busy
//! waits on that connection's mutex. A query that outlives its timeout is
//! interrupted so the connection is released straight away.

use rusqlite::{params_from_iter, Connection, InterruptHandle, OpenFlags, Row};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info};

use async_trait::async_trait;

use super::{
    Driver, DriverSummary, LapRecord, Race, Statement, StoreError, StoreResult, TelemetrySample,
    TelemetryStore,
};

/// Default bound on a single query
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 10_000;

/// Connection settings for [`SqliteStore`]
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file
    pub path: PathBuf,
    /// Number of pooled connections (at least one is always opened)
    pub pool_size: usize,
    /// Per-query timeout in milliseconds
    pub query_timeout_ms: u64,
}

impl SqliteConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pool_size: 4,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
        }
    }

    /// Builder method: set pool size
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Builder method: set query timeout
    pub fn query_timeout_ms(mut self, ms: u64) -> Self {
        self.query_timeout_ms = ms;
        self
    }
}

/// Fixed set of connections handed out round-robin
struct ConnectionPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ConnectionPool {
    fn new(connections: Vec<Connection>) -> Self {
        Self {
            connections: connections.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Execute a statement on the next connection and scan every row.
    ///
    /// Runs on a blocking thread. The connection's interrupt handle is
    /// registered with `cancel` only while the statement runs.
    fn fetch_all<T, F>(
        &self,
        stmt: &Statement,
        map_row: F,
        cancel: &Cancellation,
    ) -> StoreResult<Vec<T>>
    where
        F: Fn(&Row<'_>) -> rusqlite::Result<T>,
    {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let conn = self.connections[slot]
            .lock()
            .map_err(|e| StoreError::Lock(format!("connection {}: {}", slot, e)))?;

        if !cancel.begin(&conn) {
            return Err(StoreError::Worker(
                "query abandoned before it started".to_string(),
            ));
        }
        let result = scan_all(&conn, stmt, map_row);
        cancel.finish();
        result
    }
}

fn scan_all<T, F>(conn: &Connection, stmt: &Statement, map_row: F) -> StoreResult<Vec<T>>
where
    F: Fn(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut prepared = conn.prepare_cached(&stmt.sql)?;
    let rows = prepared.query_map(params_from_iter(stmt.params.iter()), |row| map_row(row))?;

    // Any row failing to scan, or the cursor failing after the last row,
    // discards everything read so far.
    let records = rows.collect::<Result<Vec<T>, _>>()?;
    Ok(records)
}

/// Shared between a query's blocking task and the request waiting on it.
///
/// Holds the connection's interrupt handle only while the task owns that
/// connection.
#[derive(Default)]
struct Cancellation {
    state: Mutex<CancelState>,
}

#[derive(Default)]
struct CancelState {
    running: Option<InterruptHandle>,
    cancelled: bool,
}

impl Cancellation {
    fn state(&self) -> MutexGuard<'_, CancelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the connection about to run. False if the request already gave up.
    fn begin(&self, conn: &Connection) -> bool {
        let mut state = self.state();
        if state.cancelled {
            return false;
        }
        state.running = Some(conn.get_interrupt_handle());
        true
    }

    fn finish(&self) {
        self.state().running = None;
    }

    /// Abort the running statement, or stop it from starting
    fn cancel(&self) {
        let mut state = self.state();
        state.cancelled = true;
        if let Some(handle) = state.running.take() {
            handle.interrupt();
        }
    }
}

/// Read-only SQLite implementation of [`TelemetryStore`]
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<ConnectionPool>,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Open a pool of read-only connections to an existing database file
    pub fn open(config: &SqliteConfig) -> StoreResult<Self> {
        let size = config.pool_size.max(1);
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let connections = (0..size)
            .map(|_| {
                Connection::open_with_flags(&config.path, flags).map_err(|e| {
                    StoreError::Connection(format!("{}: {}", config.path.display(), e))
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        info!(
            path = %config.path.display(),
            pool_size = size,
            query_timeout_ms = config.query_timeout_ms,
            "Opened SQLite store"
        );

        Ok(Self {
            pool: Arc::new(ConnectionPool::new(connections)),
            query_timeout: Duration::from_millis(config.query_timeout_ms),
        })
    }

    /// Wrap an already-open connection as a single-connection store
    pub fn from_connection(conn: Connection, query_timeout: Duration) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new(vec![conn])),
            query_timeout,
        }
    }

    /// Number of pooled connections
    pub fn pool_size(&self) -> usize {
        self.pool.connections.len()
    }

    async fn fetch<T, F>(&self, stmt: Statement, map_row: F) -> StoreResult<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        debug_assert_eq!(stmt.placeholder_count(), stmt.params.len());

        let pool = Arc::clone(&self.pool);
        let cancel = Arc::new(Cancellation::default());
        let task = {
            let cancel = Arc::clone(&cancel);
            tokio::task::spawn_blocking(move || pool.fetch_all(&stmt, map_row, &cancel))
        };

        let result = match tokio::time::timeout(self.query_timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => {
                cancel.cancel();
                Err(StoreError::Timeout(self.query_timeout.as_millis() as u64))
            }
        };

        match &result {
            Ok(rows) => debug!(rows = rows.len(), "Query complete"),
            Err(e) => error!(error = %e, "Query failed"),
        }
        result
    }
}

fn race_from_row(row: &Row<'_>) -> rusqlite::Result<Race> {
    Ok(Race {
        race_id: row.get(0)?,
        name: row.get(1)?,
        circuit: row.get(2)?,
        date: row.get(3)?,
    })
}

fn driver_from_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver::from_code(row.get::<_, String>(0)?))
}

fn lap_from_row(row: &Row<'_>) -> rusqlite::Result<LapRecord> {
    Ok(LapRecord {
        race_id: row.get(0)?,
        driver: row.get(1)?,
        session: row.get(2)?,
        lap_number: row.get(3)?,
        lap_time_seconds: row.get(4)?,
        compound: row.get(5)?,
    })
}

fn telemetry_from_row(row: &Row<'_>) -> rusqlite::Result<TelemetrySample> {
    Ok(TelemetrySample {
        race_id: row.get(0)?,
        driver: row.get(1)?,
        session: row.get(2)?,
        lap_number: row.get(3)?,
        timestamp_seconds: row.get(4)?,
        speed: row.get(5)?,
        rpm: row.get(6)?,
        gear: row.get(7)?,
        throttle: row.get(8)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<DriverSummary> {
    Ok(DriverSummary {
        race_id: row.get(0)?,
        driver: row.get(1)?,
        session: row.get(2)?,
        average_lap_time: row.get(3)?,
        fastest_lap_time: row.get(4)?,
        laps_completed: row.get(5)?,
    })
}

#[async_trait]
impl TelemetryStore for SqliteStore {
    async fn races(&self, stmt: Statement) -> StoreResult<Vec<Race>> {
        self.fetch(stmt, race_from_row).await
    }

    async fn drivers(&self, stmt: Statement) -> StoreResult<Vec<Driver>> {
        self.fetch(stmt, driver_from_row).await
    }

    async fn laps(&self, stmt: Statement) -> StoreResult<Vec<LapRecord>> {
        self.fetch(stmt, lap_from_row).await
    }

    async fn telemetry(&self, stmt: Statement) -> StoreResult<Vec<TelemetrySample>> {
        self.fetch(stmt, telemetry_from_row).await
    }

    async fn summaries(&self, stmt: Statement) -> StoreResult<Vec<DriverSummary>> {
        self.fetch(stmt, summary_from_row).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.fetch(Statement::new("SELECT 1"), |row| row.get::<_, i64>(0))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::create_tables;
    use tempfile::tempdir;

    fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO races VALUES ('2024_spa', 'Belgian Grand Prix', 'Spa-Francorchamps', '2024-07-28');
             INSERT INTO races VALUES ('2024_monza', 'Italian Grand Prix', 'Monza', '2024-09-01');
             INSERT INTO lap_times VALUES ('2024_spa', 'VER', 'R', 1, 110.5);
             INSERT INTO lap_times VALUES ('2024_spa', 'VER', 'R', 2, 107.25);",
        )
        .unwrap();
        conn
    }

    fn store_with(conn: Connection) -> SqliteStore {
        SqliteStore::from_connection(conn, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_binds_positional_params() {
        let store = store_with(seeded_connection());

        let stmt = Statement {
            sql: "SELECT race_id, name, circuit, date FROM races WHERE race_id = ?".to_string(),
            params: vec!["2024_monza".into()],
        };
        let races = store.races(stmt).await.unwrap();

        assert_eq!(races.len(), 1);
        assert_eq!(races[0].circuit, "Monza");
    }

    #[tokio::test]
    async fn test_scan_failure_discards_rows() {
        let conn = seeded_connection();
        // Third row carries a lap time that can't be read as a float
        conn.execute(
            "INSERT INTO lap_times VALUES ('2024_spa', 'VER', 'R', 3, 'pit')",
            [],
        )
        .unwrap();
        let store = store_with(conn);

        let stmt = Statement {
            sql: "SELECT race_id, driver, session, lap_number, lap_time_seconds, '' \
                  FROM lap_times ORDER BY lap_number"
                .to_string(),
            params: Vec::new(),
        };
        let err = store.laps(stmt).await.unwrap_err();

        assert!(matches!(err, StoreError::Scan(_)));
    }

    #[tokio::test]
    async fn test_bad_sql_is_query_error() {
        let store = store_with(seeded_connection());

        let err = store
            .races(Statement::new("SELECT * FROM no_such_table"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Query(_)));
    }

    #[tokio::test]
    async fn test_ping() {
        let store = store_with(Connection::open_in_memory().unwrap());
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_timed_out_query_releases_connection() {
        let store = SqliteStore::from_connection(
            Connection::open_in_memory().unwrap(),
            Duration::from_millis(200),
        );

        let slow = Statement::new(
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 300000000) \
             SELECT COUNT(*) FROM c",
        );
        let err = store
            .fetch(slow, |row| row.get::<_, i64>(0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(200)));

        // Same single connection; only free if the slow query was aborted
        store.ping().await.unwrap();
    }

    #[test]
    fn test_cancel_before_start_skips_query() {
        let conn = Connection::open_in_memory().unwrap();
        let pool = ConnectionPool::new(vec![conn]);
        let cancel = Cancellation::default();
        cancel.cancel();

        let err = pool
            .fetch_all(&Statement::new("SELECT 1"), |row| row.get::<_, i64>(0), &cancel)
            .unwrap_err();
        assert!(matches!(err, StoreError::Worker(_)));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempdir().unwrap();
        let config = SqliteConfig::new(dir.path().join("absent.db"));

        let err = SqliteStore::open(&config).err().unwrap();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn test_file_backed_pool_is_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("racing_data.db");
        {
            let conn = Connection::open(&path).unwrap();
            create_tables(&conn).unwrap();
            conn.execute(
                "INSERT INTO races VALUES ('2024_spa', 'Belgian Grand Prix', 'Spa', '2024-07-28')",
                [],
            )
            .unwrap();
        }

        let store = SqliteStore::open(&SqliteConfig::new(&path).pool_size(3)).unwrap();
        assert_eq!(store.pool_size(), 3);

        // Spread queries over every pooled connection
        for _ in 0..6 {
            let races = store
                .races(Statement::new("SELECT race_id, name, circuit, date FROM races"))
                .await
                .unwrap();
            assert_eq!(races.len(), 1);
        }

        let err = store
            .races(Statement::new("DELETE FROM races RETURNING race_id, name, circuit, date"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn test_zero_pool_size_opens_one_connection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("racing_data.db");
        create_tables(&Connection::open(&path).unwrap()).unwrap();

        let store = SqliteStore::open(&SqliteConfig::new(&path).pool_size(0)).unwrap();
        assert_eq!(store.pool_size(), 1);
    }
}
