//! Aria Storage
//!
//! `SQLite` persistence for the player's durable state.
//!
//! The player core writes three JSON documents (queue snapshot, equalizer
//! gains, playback preferences) through the `KeyValueStore` seam. This crate
//! backs that seam with a single `key_value_store` table.
//!
//! # Example
//!
//! ```rust,no_run
//! use aria_core::storage::{KeyValueStore, QUEUE_STATE_KEY};
//! use aria_storage::{create_pool, run_migrations, SqliteKeyValueStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://aria.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteKeyValueStore::new(pool);
//! let queue = store.get(QUEUE_STATE_KEY).await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod kv;

pub use error::{Result, StorageError};
pub use kv::SqliteKeyValueStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before the store is handed to the player.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://aria.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(url = %database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!(url = %database_url, "SQLite pool ready");

    Ok(pool)
}
