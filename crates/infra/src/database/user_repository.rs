//! User repository implementation using SQLite
//!
//! One row per `(email, provider)`; the uniqueness constraint lives in the
//! schema and surfaces as `MoneymonError::Conflict` on insert.

use std::sync::Arc;

use async_trait::async_trait;
use moneymon_core::user::ports::UserRepository as UserRepositoryPort;
use moneymon_domain::{AuthProvider, LocalUser, MoneymonError, Result as DomainResult};
use rusqlite::{params, Row, ToSql};
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use super::pool::SqliteConnection;

const USER_COLUMNS: &str =
    "id, name, email, provider, picture, is_email_verified, last_login, created_at, updated_at";

/// SQLite-backed implementation of `UserRepository`
pub struct SqliteUserRepository {
    db: Arc<DbManager>,
}

impl SqliteUserRepository {
    /// Create a new repository instance
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepositoryPort for SqliteUserRepository {
    async fn find_by_email_and_provider(
        &self,
        email: &str,
        provider: AuthProvider,
    ) -> DomainResult<Option<LocalUser>> {
        let db = Arc::clone(&self.db);
        let email = email.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<LocalUser>> {
            let conn = db.get_connection()?;
            let sql =
                format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND provider = ?2");
            optional(conn.query_row(&sql, params![&email, provider.as_str()], map_user_row))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<LocalUser>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<LocalUser>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            optional(conn.query_row(&sql, params![&id], map_user_row))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert(&self, user: &LocalUser) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let user = user.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            insert_user(&conn, &user).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, user: &LocalUser) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let user = user.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = update_user(&conn, &user).map_err(map_sql_error)?;
            if changed == 0 {
                return Err(MoneymonError::NotFound(format!("user {}", user.id)));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn optional(result: rusqlite::Result<LocalUser>) -> DomainResult<Option<LocalUser>> {
    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) => Err(map_sql_error(err)),
    }
}

/// Map a database row to `LocalUser`
fn map_user_row(row: &Row<'_>) -> rusqlite::Result<LocalUser> {
    let provider: String = row.get(3)?;
    let provider = provider.parse::<AuthProvider>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(LocalUser {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        provider,
        picture: row.get(4)?,
        is_email_verified: int_to_bool(row.get(5)?),
        last_login: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert a user
fn insert_user(conn: &SqliteConnection, user: &LocalUser) -> rusqlite::Result<()> {
    let params: [&dyn ToSql; 9] = [
        &user.id,
        &user.name,
        &user.email,
        &user.provider.as_str(),
        &user.picture,
        &bool_to_int(user.is_email_verified),
        &user.last_login,
        &user.created_at,
        &user.updated_at,
    ];

    conn.execute(
        "INSERT INTO users (
            id, name, email, provider, picture, is_email_verified,
            last_login, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params.as_slice(),
    )?;
    Ok(())
}

/// Update a user's mutable fields, returning the number of rows changed
fn update_user(conn: &SqliteConnection, user: &LocalUser) -> rusqlite::Result<usize> {
    let params: [&dyn ToSql; 6] = [
        &user.name,
        &user.picture,
        &bool_to_int(user.is_email_verified),
        &user.last_login,
        &user.updated_at,
        &user.id, // WHERE clause
    ];

    conn.execute(
        "UPDATE users SET
            name = ?1, picture = ?2, is_email_verified = ?3, last_login = ?4, updated_at = ?5
         WHERE id = ?6",
        params.as_slice(),
    )
}

const fn bool_to_int(value: bool) -> i32 {
    if value {
        1
    } else {
        0
    }
}

const fn int_to_bool(value: i32) -> bool {
    value != 0
}

fn map_join_error(err: task::JoinError) -> MoneymonError {
    if err.is_cancelled() {
        MoneymonError::Internal("blocking task cancelled".into())
    } else {
        MoneymonError::Internal(format!("blocking task failed: {err}"))
    }
}
