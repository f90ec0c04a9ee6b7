//! User document and its author projection.

use super::thread::ThreadId;
use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{1,32}$").expect("valid handle regex"));

/// Stored user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    /// Authored root posts in push order.
    pub threads: Vec<ThreadId>,
    pub created_at: i64,
}

/// Restricted author projection attached to replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub image: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

/// Input for user creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Caller-provided id, e.g. from an external identity provider.
    /// A fresh v4 id is generated when `None`.
    pub id: Option<UserId>,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

impl NewUser {
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

/// Validates username-like handles shared by users and communities.
pub fn validate_handle(value: &str) -> Result<(), ValidationError> {
    if HANDLE_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidHandle(value.to_string()))
    }
}

pub(crate) fn validate_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}
