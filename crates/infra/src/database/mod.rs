//! Database implementations

pub mod manager;
pub mod pool;
pub mod user_repository;

pub use manager::DbManager;
pub use pool::{create_pool, SqliteConnection, SqlitePool, SqlitePoolConfig};
pub use user_repository::SqliteUserRepository;
