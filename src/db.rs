//! Global database pool.
//!
//! The pool is initialized once at startup and shared process-wide, so
//! modules can reach the database without threading a handle through every
//! call site.

use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connect to the database and store the pool. Panics on failure; the
/// application cannot run without it.
pub async fn init_db(database_url: String) {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(16)
        .connect_timeout(Duration::from_secs(8));

    let pool = Database::connect(options)
        .await
        .expect("Failed to connect to database.");

    DB_POOL
        .set(pool)
        .expect("init_db() must only be called once.");
}

pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("init_db() has not been called.")
}
