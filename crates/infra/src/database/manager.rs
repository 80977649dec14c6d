//! Database connection manager backed by the SQLite pool.

use std::path::{Path, PathBuf};

use moneymon_domain::{MoneymonError, Result};
use rusqlite::params;
use tracing::info;

use super::pool::{create_pool, SqliteConnection, SqlitePool, SqlitePoolConfig};
use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps a [`SqlitePool`].
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size.
    ///
    /// # Errors
    /// Returns `MoneymonError::Database` if the pool cannot be created.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let config = SqlitePoolConfig { max_size: pool_size.max(1), ..SqlitePoolConfig::default() };
        let pool = create_pool(&path, &config)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            "sqlite pool initialised"
        );

        Ok(Self { pool, path })
    }

    /// Acquire a connection from the pool.
    ///
    /// # Errors
    /// Returns `MoneymonError::Database` when no connection frees up within
    /// the pool timeout.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool
            .get()
            .map_err(|e| MoneymonError::Database(format!("connection pool exhausted: {e}")))
    }

    /// Ensure the full schema exists on the current database.
    ///
    /// # Errors
    /// Returns the mapped SQLite error if the schema cannot be applied.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at)
             VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the database answers a trivial query.
    ///
    /// # Errors
    /// Returns the mapped SQLite error when the database is unreachable.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(map_sql_error)?;
        Ok(())
    }
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> MoneymonError {
    MoneymonError::from(InfraError::from(err))
}
