//! Schema versions of the threads store.
//!
//! Each entry is `(version, sql)`; the applied version lives in
//! `PRAGMA user_version`. All pending steps run inside one transaction, so a
//! failed step leaves the store at its previous version.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Ordered schema steps. Versions start at 1 and increase by one.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Highest schema version this build can open.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |&(version, _)| version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store was written by a newer build.
/// - SQLite errors from a failing step; nothing from the batch is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let target = latest_version();
    if from_version > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: target,
        });
    }

    let pending: Vec<_> = SCHEMA_STEPS
        .iter()
        .filter(|&&(version, _)| version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for &&(version, sql) in &pending {
        tx.execute_batch(sql)?;
        // PRAGMA does not take bound parameters.
        tx.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from_version} to_version={target} steps={}",
        pending.len()
    );
    Ok(())
}
