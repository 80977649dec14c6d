//! SQLite connection pool
//!
//! r2d2 pool over `r2d2_sqlite` with per-connection pragmas applied on
//! checkout: WAL journaling, NORMAL synchronous mode and a busy timeout so
//! concurrent writers wait instead of failing immediately.

use std::path::Path;
use std::time::Duration;

use moneymon_domain::{MoneymonError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::warn;

/// Shared pool type.
pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Connection checked out of a [`SqlitePool`].
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// SQLite pool configuration
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// How long a caller waits for a free connection
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite lock contention
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 8,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
        }
    }
}

/// Build a pool for the database file at `path`, creating it if needed.
///
/// # Errors
/// Returns `MoneymonError::Database` if the file cannot be opened or the
/// pragmas fail.
pub fn create_pool(path: &Path, config: &SqlitePoolConfig) -> Result<SqlitePool> {
    let pragma_config = config.clone();
    let manager = SqliteConnectionManager::file(path)
        .with_init(move |conn| apply_connection_pragmas(conn, &pragma_config));

    Pool::builder()
        .max_size(config.max_size.max(1))
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .map_err(|e| {
            warn!(error = %e, "failed to create sqlite pool");
            MoneymonError::Database(format!("failed to create pool: {e}"))
        })
}

/// Apply connection-level pragmas
fn apply_connection_pragmas(conn: &Connection, config: &SqlitePoolConfig) -> rusqlite::Result<()> {
    let mut pragma_sql = String::new();

    if config.enable_wal {
        pragma_sql.push_str("PRAGMA journal_mode=WAL;\n");
        pragma_sql.push_str("PRAGMA wal_autocheckpoint=1000;\n");
    }
    pragma_sql.push_str("PRAGMA synchronous=NORMAL;\n");

    conn.execute_batch(&pragma_sql)?;
    conn.busy_timeout(config.busy_timeout)
}
