//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `username` is unique across users.
//! - `User::threads` is read from `user_threads` ordered by push order.

use super::{
    dedup_ids, ensure_connection_ready, id_batches, map_unique_violation, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::thread::ThreadId;
use crate::model::user::{NewUser, User, UserId};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    username,
    name,
    image,
    bio,
    created_at
FROM users";

/// Repository interface for user documents.
pub trait UserRepository {
    /// Inserts one user and returns the stored document.
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    /// Loads one user with its authored thread list.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Lists authored root thread ids in push order.
    fn list_user_threads(&self, id: UserId) -> RepoResult<Vec<ThreadId>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;

        let id = user.id.unwrap_or_else(Uuid::new_v4);
        self.conn
            .execute(
                "INSERT INTO users (uuid, username, name, image, bio)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id.to_string(),
                    user.username.as_str(),
                    user.name.trim(),
                    user.image.as_deref(),
                    user.bio.as_deref(),
                ],
            )
            .map_err(|err| map_unique_violation(err, "user", &user.username))?;

        self.get_user(id)?.ok_or(RepoError::UserNotFound(id))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(load_users_by_ids(self.conn, &[id])?.remove(&id))
    }

    fn list_user_threads(&self, id: UserId) -> RepoResult<Vec<ThreadId>> {
        if !user_exists(self.conn, id)? {
            return Err(RepoError::UserNotFound(id));
        }
        let mut stmt = self.conn.prepare(
            "SELECT thread_uuid
             FROM user_threads
             WHERE user_uuid = ?1
             ORDER BY sort_order ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "user_threads.thread_uuid")?);
        }
        Ok(ids)
    }
}

pub(crate) fn user_exists(conn: &Connection, id: UserId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Loads users (with thread lists) keyed by id; unknown ids are absent.
pub(crate) fn load_users_by_ids(
    conn: &Connection,
    ids: &[UserId],
) -> RepoResult<HashMap<UserId, User>> {
    let ids = dedup_ids(ids.iter().copied());
    let mut users = HashMap::with_capacity(ids.len());

    for (placeholders, values) in id_batches(&ids) {
        let mut stmt = conn.prepare(&format!(
            "{USER_SELECT_SQL} WHERE uuid IN ({placeholders});"
        ))?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            let user = parse_user_row(row)?;
            users.insert(user.id, user);
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT user_uuid, thread_uuid
             FROM user_threads
             WHERE user_uuid IN ({placeholders})
             ORDER BY user_uuid ASC, sort_order ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            let user_text: String = row.get(0)?;
            let thread_text: String = row.get(1)?;
            let user_id = parse_uuid(&user_text, "user_threads.user_uuid")?;
            if let Some(user) = users.get_mut(&user_id) {
                user.threads
                    .push(parse_uuid(&thread_text, "user_threads.thread_uuid")?);
            }
        }
    }

    Ok(users)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    Ok(User {
        id: parse_uuid(&uuid_text, "users.uuid")?,
        username: row.get("username")?,
        name: row.get("name")?,
        image: row.get("image")?,
        bio: row.get("bio")?,
        threads: Vec::new(),
        created_at: row.get("created_at")?,
    })
}
