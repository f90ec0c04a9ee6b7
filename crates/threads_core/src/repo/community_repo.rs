//! Community repository contracts and SQLite implementation.

use super::{
    dedup_ids, ensure_connection_ready, id_batches, map_unique_violation, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::community::{Community, CommunityId, NewCommunity};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;
use uuid::Uuid;

pub trait CommunityRepository {
    fn create_community(&self, community: &NewCommunity) -> RepoResult<Community>;
    fn get_community(&self, id: CommunityId) -> RepoResult<Option<Community>>;
}

pub struct SqliteCommunityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommunityRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CommunityRepository for SqliteCommunityRepository<'_> {
    fn create_community(&self, community: &NewCommunity) -> RepoResult<Community> {
        community.validate()?;

        let id = community.id.unwrap_or_else(Uuid::new_v4);
        self.conn
            .execute(
                "INSERT INTO communities (uuid, username, name, image, bio)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id.to_string(),
                    community.username.as_str(),
                    community.name.trim(),
                    community.image.as_deref(),
                    community.bio.as_deref(),
                ],
            )
            .map_err(|err| map_unique_violation(err, "community", &community.username))?;

        self.get_community(id)?
            .ok_or(RepoError::CommunityNotFound(id))
    }

    fn get_community(&self, id: CommunityId) -> RepoResult<Option<Community>> {
        Ok(load_communities_by_ids(self.conn, &[id])?.remove(&id))
    }
}

pub(crate) fn load_communities_by_ids(
    conn: &Connection,
    ids: &[CommunityId],
) -> RepoResult<HashMap<CommunityId, Community>> {
    let ids = dedup_ids(ids.iter().copied());
    let mut communities = HashMap::with_capacity(ids.len());

    for (placeholders, values) in id_batches(&ids) {
        let mut stmt = conn.prepare(&format!(
            "SELECT uuid, username, name, image, bio, created_at
             FROM communities
             WHERE uuid IN ({placeholders});"
        ))?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            let community = parse_community_row(row)?;
            communities.insert(community.id, community);
        }
    }

    Ok(communities)
}

fn parse_community_row(row: &Row<'_>) -> RepoResult<Community> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Community {
        id: parse_uuid(&uuid_text, "communities.uuid")?,
        username: row.get("username")?,
        name: row.get("name")?,
        image: row.get("image")?,
        bio: row.get("bio")?,
        created_at: row.get("created_at")?,
    })
}
