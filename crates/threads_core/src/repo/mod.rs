//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for threads, users and
//!   communities.
//! - Isolate SQL details, including reference expansion, from services.
//!
//! # Invariants
//! - Repository writes validate documents before persistence.
//! - Multi-row writes (thread + back-reference) commit atomically.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::community::CommunityId;
use crate::model::thread::ThreadId;
use crate::model::user::UserId;
use crate::model::ValidationError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod community_repo;
pub mod populate;
pub mod thread_repo;
pub mod user_repo;

/// Result type shared by all repositories.
pub type RepoResult<T> = Result<T, RepoError>;

/// SQLite host parameter budget per `IN (...)` batch.
const MAX_BIND_BATCH: usize = 500;

#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Document rejected by write-time validation.
    Validation(ValidationError),
    ThreadNotFound(ThreadId),
    UserNotFound(UserId),
    CommunityNotFound(CommunityId),
    /// A unique handle is already taken.
    DuplicateHandle {
        collection: &'static str,
        handle: String,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid document.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::ThreadNotFound(id) => write!(f, "thread not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::CommunityNotFound(id) => write!(f, "community not found: {id}"),
            Self::DuplicateHandle { collection, handle } => {
                write!(f, "{collection} handle `{handle}` is already taken")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "repository requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Table name plus the columns a repository reads or writes.
type TableContract = (&'static str, &'static [&'static str]);

const SCHEMA_CONTRACT: &[TableContract] = &[
    (
        "users",
        &["uuid", "username", "name", "image", "bio", "created_at"],
    ),
    (
        "communities",
        &["uuid", "username", "name", "image", "bio", "created_at"],
    ),
    (
        "threads",
        &[
            "uuid",
            "text",
            "author_uuid",
            "community_uuid",
            "parent_uuid",
            "created_at",
        ],
    ),
    ("thread_children", &["parent_uuid", "child_uuid", "sort_order"]),
    ("user_threads", &["user_uuid", "thread_uuid", "sort_order"]),
];

/// Verifies the connection is migrated and exposes every expected column.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in SCHEMA_CONTRACT {
        let existing = table_columns(conn, table)?;
        if existing.is_empty() {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !existing.iter().any(|current| current == column) {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(1)?);
    }
    Ok(columns)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

/// Splits ids into bind-safe batches and renders `?, ?, ...` for each.
pub(crate) fn id_batches(ids: &[Uuid]) -> impl Iterator<Item = (String, Vec<String>)> + '_ {
    ids.chunks(MAX_BIND_BATCH).map(|chunk| {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let values = chunk.iter().map(Uuid::to_string).collect();
        (placeholders, values)
    })
}

/// Maps a UNIQUE violation to `DuplicateHandle`, passing other errors through.
pub(crate) fn map_unique_violation(
    err: rusqlite::Error,
    collection: &'static str,
    handle: &str,
) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateHandle {
                collection,
                handle: handle.to_string(),
            }
        }
        _ => err.into(),
    }
}

pub(crate) fn dedup_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
