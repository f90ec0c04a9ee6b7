//! Reference expansion ("population") for thread documents.
//!
//! # Responsibility
//! - Describe which reference fields of a thread get replaced by the
//!   referenced document, and with which projection.
//! - Resolve one shape level with one batched query per referenced
//!   collection, recursing into `children` only as deep as the shape nests.
//!
//! # Invariants
//! - A field without a selector stays a raw id.
//! - A reference whose document is missing stays a raw id.
//! - Child order is the stored `children` order.

use super::community_repo::load_communities_by_ids;
use super::thread_repo::load_threads_by_ids;
use super::user_repo::load_users_by_ids;
use super::{dedup_ids, RepoResult};
use crate::model::community::CommunitySummary;
use crate::model::expanded::{ChildRef, CommunityRef, ThreadNode, UserRef};
use crate::model::thread::{Thread, ThreadId};
use crate::model::user::UserSummary;
use rusqlite::Connection;
use std::collections::HashMap;

/// Projection applied to an expanded author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSelect {
    /// Whole user document.
    Full,
    /// `{ id, name, image }`.
    Summary,
}

/// Projection applied to an expanded community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunitySelect {
    Full,
    /// `{ id, name, image }`.
    Summary,
}

/// Declarative expansion shape for one thread level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadPopulate {
    pub author: Option<UserSelect>,
    pub community: Option<CommunitySelect>,
    /// Shape applied to each reply; `None` leaves replies as ids.
    pub children: Option<Box<ThreadPopulate>>,
}

impl ThreadPopulate {
    /// Shape that expands nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn author(mut self, select: UserSelect) -> Self {
        self.author = Some(select);
        self
    }

    pub fn community(mut self, select: CommunitySelect) -> Self {
        self.community = Some(select);
        self
    }

    pub fn children(mut self, shape: ThreadPopulate) -> Self {
        self.children = Some(Box::new(shape));
        self
    }

    /// Number of thread levels this shape materializes, counting the root.
    pub fn depth(&self) -> usize {
        1 + self.children.as_ref().map_or(0, |nested| nested.depth())
    }
}

/// Expands `threads` according to `shape`, preserving input order.
pub(crate) fn populate_threads(
    conn: &Connection,
    threads: Vec<Thread>,
    shape: &ThreadPopulate,
) -> RepoResult<Vec<ThreadNode>> {
    if threads.is_empty() {
        return Ok(Vec::new());
    }

    let users = match shape.author {
        Some(_) => {
            let ids: Vec<_> = threads.iter().map(|thread| thread.author).collect();
            load_users_by_ids(conn, &ids)?
        }
        None => HashMap::new(),
    };

    let communities = match shape.community {
        Some(_) => {
            let ids: Vec<_> = threads.iter().filter_map(|thread| thread.community).collect();
            load_communities_by_ids(conn, &ids)?
        }
        None => HashMap::new(),
    };

    let replies: HashMap<ThreadId, ThreadNode> = match shape.children.as_deref() {
        Some(nested) => {
            let ids = dedup_ids(
                threads
                    .iter()
                    .flat_map(|thread| thread.children.iter().copied()),
            );
            let loaded = load_threads_by_ids(conn, &ids)?;
            populate_threads(conn, loaded, nested)?
                .into_iter()
                .map(|node| (node.id, node))
                .collect()
        }
        None => HashMap::new(),
    };

    let nodes = threads
        .into_iter()
        .map(|thread| {
            let mut node = ThreadNode::unexpanded(thread);

            if let Some(select) = shape.author {
                if let Some(user) = users.get(&node.author.id()) {
                    node.author = match select {
                        UserSelect::Full => UserRef::Full(user.clone()),
                        UserSelect::Summary => UserRef::Summary(UserSummary::from(user)),
                    };
                }
            }

            if let Some(select) = shape.community {
                let community_id = node.community.as_ref().map(CommunityRef::id);
                if let Some(community) = community_id.and_then(|id| communities.get(&id)) {
                    node.community = Some(match select {
                        CommunitySelect::Full => CommunityRef::Full(community.clone()),
                        CommunitySelect::Summary => {
                            CommunityRef::Summary(CommunitySummary::from(community))
                        }
                    });
                }
            }

            if shape.children.is_some() {
                for child in node.children.iter_mut() {
                    if let Some(reply) = replies.get(&child.id()) {
                        *child = ChildRef::Expanded(Box::new(reply.clone()));
                    }
                }
            }

            node
        })
        .collect();

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::{CommunitySelect, ThreadPopulate, UserSelect};

    #[test]
    fn depth_counts_nested_levels() {
        assert_eq!(ThreadPopulate::none().depth(), 1);
        let shape = ThreadPopulate::none()
            .community(CommunitySelect::Summary)
            .children(ThreadPopulate::none().children(
                ThreadPopulate::none().author(UserSelect::Summary),
            ));
        assert_eq!(shape.depth(), 3);
    }
}
