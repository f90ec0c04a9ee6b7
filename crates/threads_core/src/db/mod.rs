//! SQLite storage bootstrap, schema migrations and the process connection
//! handle.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the threads store.
//! - Apply schema migrations in deterministic order.
//! - Own the lazily-opened, memoized connection used by action callers.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - A connection is memoized only after it opened and migrated successfully.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod connection;
pub mod migrations;
mod open;

pub use connection::{ConnectionManager, DatabaseTarget};
pub use open::{open_db, open_db_in_memory, open_target};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// No connection string is configured; the store runs in degraded mode.
    MissingConnectionString,
    /// Connection string does not name a SQLite target.
    InvalidConnectionString(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MissingConnectionString => {
                write!(f, "database connection string is not configured")
            }
            Self::InvalidConnectionString(value) => {
                write!(f, "unsupported database connection string `{value}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::MissingConnectionString => None,
            Self::InvalidConnectionString(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
