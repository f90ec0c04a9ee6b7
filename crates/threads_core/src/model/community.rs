//! Community document.

use super::user::{validate_handle, validate_required};
use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CommunityId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: CommunityId,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_at: i64,
}

/// Restricted projection used on thread detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySummary {
    pub id: CommunityId,
    pub name: String,
    pub image: Option<String>,
}

impl From<&Community> for CommunitySummary {
    fn from(community: &Community) -> Self {
        Self {
            id: community.id,
            name: community.name.clone(),
            image: community.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommunity {
    pub id: Option<CommunityId>,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

impl NewCommunity {
    pub fn new(username: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            name: name.into(),
            image: None,
            bio: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_handle(&self.username)?;
        validate_required("name", &self.name)
    }
}
