//! Process connection handle for action callers.
//!
//! # Responsibility
//! - Parse the configured connection string into a SQLite target.
//! - Open the store lazily on first use and hand out the same connection
//!   afterwards.
//!
//! # Invariants
//! - The memo is set only after a successful open + migrate.
//! - A failed open leaves the manager disconnected; the next call retries.
//! - Concurrent first calls open at most one connection.

use super::{open_target, DbError, DbResult};
use crate::config::DatabaseConfig;
use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Parsed form of a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// Private in-memory database, lost when the manager is dropped.
    Memory,
    /// SQLite database file.
    File(PathBuf),
}

impl DatabaseTarget {
    /// Parses `:memory:`, `sqlite::memory:`, `sqlite://<path>`,
    /// `sqlite:<path>`, `file:<path>` or a bare path.
    pub fn parse(raw: &str) -> DbResult<Self> {
        let trimmed = raw.trim();
        if matches!(trimmed, ":memory:" | "sqlite::memory:" | "sqlite://:memory:") {
            return Ok(Self::Memory);
        }

        let path = ["sqlite://", "sqlite:", "file:"]
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);

        if path.is_empty() || path.contains("://") {
            return Err(DbError::InvalidConnectionString(trimmed.to_string()));
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

/// Lazily-opened connection owned by whoever serves requests.
pub struct ConnectionManager {
    config: DatabaseConfig,
    conn: OnceCell<Mutex<Connection>>,
}

impl ConnectionManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            conn: OnceCell::new(),
        }
    }

    /// Builds a manager from `THREADS_DATABASE_URL`.
    pub fn from_env() -> Self {
        Self::new(DatabaseConfig::from_env())
    }

    /// Returns the memoized connection, opening it on first use.
    ///
    /// # Errors
    /// - `MissingConnectionString` when no URL is configured (degraded mode).
    /// - `InvalidConnectionString` when the URL is not a SQLite target.
    /// - Open/migration errors from [`open_target`].
    pub fn ensure_connected(&self) -> DbResult<MutexGuard<'_, Connection>> {
        if let Some(conn) = self.conn.get() {
            debug!("event=db_connect module=db status=reused");
            return Ok(lock(conn));
        }

        let Some(url) = self.config.url.as_deref() else {
            warn!("event=db_connect module=db status=skipped error_code=missing_connection_string");
            return Err(DbError::MissingConnectionString);
        };
        let target = DatabaseTarget::parse(url).map_err(|err| {
            error!("event=db_connect module=db status=error error_code=invalid_connection_string");
            err
        })?;

        let mut opened_here = false;
        let conn = self
            .conn
            .get_or_try_init(|| -> DbResult<Mutex<Connection>> {
                opened_here = true;
                open_target(&target).map(Mutex::new)
            })
            .map_err(|err| {
                error!("event=db_connect module=db status=error error_code=db_open_failed error={err}");
                err
            })?;
        if opened_here {
            info!("event=db_connect module=db status=ok");
        }
        Ok(lock(conn))
    }

    /// Whether a connection has been opened successfully.
    pub fn is_connected(&self) -> bool {
        self.conn.get().is_some()
    }
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    // Open transactions roll back on drop, so a poisoned handle is still usable.
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}
