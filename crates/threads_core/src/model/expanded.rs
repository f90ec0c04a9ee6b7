//! Expanded (populated) read models.
//!
//! # Responsibility
//! - Represent a thread whose reference fields were either replaced by the
//!   referenced document or left as raw ids.
//!
//! # Invariants
//! - Serialized form matches the stored document shape: an unexpanded
//!   reference serializes as its id string, an expanded one as an object.
//! - Expansion depth is bounded by the shape used to load the node; below
//!   that depth every reference is `*::Id`.

use super::community::{Community, CommunityId, CommunitySummary};
use super::thread::{Thread, ThreadId};
use super::user::{User, UserId, UserSummary};
use serde::Serialize;

/// Author reference in one of its load states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(UserId),
    Full(User),
    Summary(UserSummary),
}

impl UserRef {
    pub fn id(&self) -> UserId {
        match self {
            Self::Id(id) => *id,
            Self::Full(user) => user.id,
            Self::Summary(summary) => summary.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommunityRef {
    Id(CommunityId),
    Full(Community),
    Summary(CommunitySummary),
}

impl CommunityRef {
    pub fn id(&self) -> CommunityId {
        match self {
            Self::Id(id) => *id,
            Self::Full(community) => community.id,
            Self::Summary(summary) => summary.id,
        }
    }
}

/// Reply reference: raw id or the reply itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChildRef {
    Id(ThreadId),
    Expanded(Box<ThreadNode>),
}

impl ChildRef {
    pub fn id(&self) -> ThreadId {
        match self {
            Self::Id(id) => *id,
            Self::Expanded(node) => node.id,
        }
    }

    /// Returns the expanded reply, if this level was populated.
    pub fn as_node(&self) -> Option<&ThreadNode> {
        match self {
            Self::Id(_) => None,
            Self::Expanded(node) => Some(node),
        }
    }
}

/// Thread with references resolved according to a population shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadNode {
    pub id: ThreadId,
    pub text: String,
    pub author: UserRef,
    pub community: Option<CommunityRef>,
    pub parent_id: Option<ThreadId>,
    pub children: Vec<ChildRef>,
    pub created_at: i64,
}

impl ThreadNode {
    /// Wraps a stored thread without expanding anything.
    pub fn unexpanded(thread: Thread) -> Self {
        Self {
            id: thread.id,
            text: thread.text,
            author: UserRef::Id(thread.author),
            community: thread.community.map(CommunityRef::Id),
            parent_id: thread.parent_id,
            children: thread.children.into_iter().map(ChildRef::Id).collect(),
            created_at: thread.created_at,
        }
    }
}

/// One page of root threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPage {
    pub posts: Vec<ThreadNode>,
    /// Whether another page exists after this one.
    pub has_next: bool,
}
