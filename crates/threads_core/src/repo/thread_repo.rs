//! Thread repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist root posts and replies together with their back-references.
//! - Serve root-post pages and single threads through [`ThreadPopulate`]
//!   expansion shapes.
//!
//! # Invariants
//! - Root listings only contain rows with `parent_uuid IS NULL`.
//! - Root listings are ordered `created_at DESC, rowid DESC` (newest first,
//!   later insert first on equal timestamps).
//! - A reply row and its `thread_children` link are written in one
//!   immediate transaction; a root row and its `user_threads` link likewise.

use super::populate::{populate_threads, ThreadPopulate};
use super::user_repo::user_exists;
use super::{dedup_ids, ensure_connection_ready, id_batches, parse_uuid, RepoError, RepoResult};
use crate::model::expanded::ThreadNode;
use crate::model::thread::{Thread, ThreadId};
use crate::model::user::UserId;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

const THREAD_SELECT_SQL: &str = "SELECT
    uuid,
    text,
    author_uuid,
    community_uuid,
    parent_uuid,
    created_at
FROM threads";

/// Pagination window over root threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootThreadQuery {
    pub limit: u32,
    pub offset: u32,
}

/// Repository interface for thread documents.
pub trait ThreadRepository {
    /// Inserts a root thread and pushes its id onto the author's thread list.
    fn create_root_thread(&self, thread: &Thread) -> RepoResult<Thread>;
    /// Inserts a reply and appends its id to the parent's `children`.
    fn create_reply(&self, reply: &Thread) -> RepoResult<Thread>;
    /// Loads one stored thread with raw references.
    fn get_thread(&self, id: ThreadId) -> RepoResult<Option<Thread>>;
    /// Loads one thread expanded by `shape`.
    fn find_thread(&self, id: ThreadId, shape: &ThreadPopulate)
        -> RepoResult<Option<ThreadNode>>;
    /// Lists one window of root threads expanded by `shape`.
    fn list_root_threads(
        &self,
        query: &RootThreadQuery,
        shape: &ThreadPopulate,
    ) -> RepoResult<Vec<ThreadNode>>;
    /// Counts all root threads.
    fn count_root_threads(&self) -> RepoResult<u64>;
    /// Whether a user with this id exists.
    fn author_exists(&self, id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed thread repository.
pub struct SqliteThreadRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteThreadRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ThreadRepository for SqliteThreadRepository<'_> {
    fn create_root_thread(&self, thread: &Thread) -> RepoResult<Thread> {
        thread.validate()?;
        if !thread.is_root() {
            return Err(RepoError::InvalidData(format!(
                "root thread {} must not carry a parent",
                thread.id
            )));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !user_exists(&tx, thread.author)? {
            return Err(RepoError::UserNotFound(thread.author));
        }

        insert_thread_row(&tx, thread)?;
        let sort_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1
             FROM user_threads
             WHERE user_uuid = ?1;",
            [thread.author.to_string()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO user_threads (user_uuid, thread_uuid, sort_order)
             VALUES (?1, ?2, ?3);",
            params![thread.author.to_string(), thread.id.to_string(), sort_order],
        )?;
        tx.commit()?;

        load_required_thread(self.conn, thread.id)
    }

    fn create_reply(&self, reply: &Thread) -> RepoResult<Thread> {
        reply.validate()?;
        let Some(parent_id) = reply.parent_id else {
            return Err(RepoError::InvalidData(format!(
                "reply {} has no parent",
                reply.id
            )));
        };

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !thread_exists(&tx, parent_id)? {
            return Err(RepoError::ThreadNotFound(parent_id));
        }
        if !user_exists(&tx, reply.author)? {
            return Err(RepoError::UserNotFound(reply.author));
        }

        insert_thread_row(&tx, reply)?;
        let sort_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1
             FROM thread_children
             WHERE parent_uuid = ?1;",
            [parent_id.to_string()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO thread_children (parent_uuid, child_uuid, sort_order)
             VALUES (?1, ?2, ?3);",
            params![parent_id.to_string(), reply.id.to_string(), sort_order],
        )?;
        tx.commit()?;

        load_required_thread(self.conn, reply.id)
    }

    fn get_thread(&self, id: ThreadId) -> RepoResult<Option<Thread>> {
        Ok(load_threads_by_ids(self.conn, &[id])?.pop())
    }

    fn find_thread(
        &self,
        id: ThreadId,
        shape: &ThreadPopulate,
    ) -> RepoResult<Option<ThreadNode>> {
        let Some(thread) = self.get_thread(id)? else {
            return Ok(None);
        };
        Ok(populate_threads(self.conn, vec![thread], shape)?.pop())
    }

    fn list_root_threads(
        &self,
        query: &RootThreadQuery,
        shape: &ThreadPopulate,
    ) -> RepoResult<Vec<ThreadNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "{THREAD_SELECT_SQL}
             WHERE parent_uuid IS NULL
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(query.limit), i64::from(query.offset)])?;
        let mut threads = Vec::new();
        while let Some(row) = rows.next()? {
            threads.push(parse_thread_row(row)?);
        }

        attach_children(self.conn, &mut threads)?;
        populate_threads(self.conn, threads, shape)
    }

    fn count_root_threads(&self) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM threads WHERE parent_uuid IS NULL;",
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative root thread count {count}")))
    }

    fn author_exists(&self, id: UserId) -> RepoResult<bool> {
        user_exists(self.conn, id)
    }
}

fn insert_thread_row(conn: &Connection, thread: &Thread) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO threads (uuid, text, author_uuid, community_uuid, parent_uuid)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            thread.id.to_string(),
            thread.text.as_str(),
            thread.author.to_string(),
            thread.community.map(|value| value.to_string()),
            thread.parent_id.map(|value| value.to_string()),
        ],
    )?;
    Ok(())
}

fn thread_exists(conn: &Connection, id: ThreadId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM threads WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_required_thread(conn: &Connection, id: ThreadId) -> RepoResult<Thread> {
    load_threads_by_ids(conn, &[id])?
        .pop()
        .ok_or(RepoError::ThreadNotFound(id))
}

/// Loads stored threads (with `children`) in the order of `ids`; unknown
/// ids are skipped.
pub(crate) fn load_threads_by_ids(conn: &Connection, ids: &[ThreadId]) -> RepoResult<Vec<Thread>> {
    let ids = dedup_ids(ids.iter().copied());
    let mut by_id = HashMap::with_capacity(ids.len());

    for (placeholders, values) in id_batches(&ids) {
        let mut stmt = conn.prepare(&format!(
            "{THREAD_SELECT_SQL} WHERE uuid IN ({placeholders});"
        ))?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            let thread = parse_thread_row(row)?;
            by_id.insert(thread.id, thread);
        }
    }

    let mut threads: Vec<Thread> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    attach_children(conn, &mut threads)?;
    Ok(threads)
}

fn attach_children(conn: &Connection, threads: &mut [Thread]) -> RepoResult<()> {
    let parent_ids: Vec<ThreadId> = threads.iter().map(|thread| thread.id).collect();
    let mut children: HashMap<ThreadId, Vec<ThreadId>> = HashMap::new();

    for (placeholders, values) in id_batches(&parent_ids) {
        let mut stmt = conn.prepare(&format!(
            "SELECT parent_uuid, child_uuid
             FROM thread_children
             WHERE parent_uuid IN ({placeholders})
             ORDER BY parent_uuid ASC, sort_order ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            let parent_text: String = row.get(0)?;
            let child_text: String = row.get(1)?;
            children
                .entry(parse_uuid(&parent_text, "thread_children.parent_uuid")?)
                .or_default()
                .push(parse_uuid(&child_text, "thread_children.child_uuid")?);
        }
    }

    for thread in threads.iter_mut() {
        thread.children = children.remove(&thread.id).unwrap_or_default();
    }
    Ok(())
}

fn parse_thread_row(row: &Row<'_>) -> RepoResult<Thread> {
    let uuid_text: String = row.get("uuid")?;
    let author_text: String = row.get("author_uuid")?;
    let community = row
        .get::<_, Option<String>>("community_uuid")?
        .map(|value| parse_uuid(&value, "threads.community_uuid"))
        .transpose()?;
    let parent_id = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "threads.parent_uuid"))
        .transpose()?;

    Ok(Thread {
        id: parse_uuid(&uuid_text, "threads.uuid")?,
        text: row.get("text")?,
        author: parse_uuid(&author_text, "threads.author_uuid")?,
        community,
        parent_id,
        children: Vec::new(),
        created_at: row.get("created_at")?,
    })
}
