//! Thread (post) document.
//!
//! # Invariants
//! - `id` is stable and never reused.
//! - `parent_id == None` marks a root post; replies always carry one.
//! - `children` is append-only and ordered by reply time.
//! - `created_at` is assigned by the store; values built in memory carry `0`
//!   until read back.

use super::community::CommunityId;
use super::user::UserId;
use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a thread.
pub type ThreadId = Uuid;

/// Upper bound for thread text, counted in characters.
pub const MAX_THREAD_TEXT_CHARS: usize = 10_000;

/// Stored thread document with raw references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    pub text: String,
    pub author: UserId,
    pub community: Option<CommunityId>,
    pub parent_id: Option<ThreadId>,
    pub children: Vec<ThreadId>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl Thread {
    /// Builds an unsaved root post.
    pub fn new_root(author: UserId, text: impl Into<String>) -> Self {
        Self::build(author, text.into(), None)
    }

    /// Builds an unsaved reply to `parent_id`.
    pub fn new_reply(parent_id: ThreadId, author: UserId, text: impl Into<String>) -> Self {
        Self::build(author, text.into(), Some(parent_id))
    }

    fn build(author: UserId, text: String, parent_id: Option<ThreadId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            author,
            community: None,
            parent_id,
            children: Vec::new(),
            created_at: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Checks write-time rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text(&self.text)
    }
}

/// Validates thread text against blank/length rules.
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    let actual_chars = text.chars().count();
    if actual_chars > MAX_THREAD_TEXT_CHARS {
        return Err(ValidationError::TextTooLong {
            max_chars: MAX_THREAD_TEXT_CHARS,
            actual_chars,
        });
    }
    Ok(())
}
