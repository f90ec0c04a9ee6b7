//! Core of the threads discussion board.
//! Posts, replies and their authors live here, together with the storage
//! rules that keep reply trees and author thread lists consistent.

pub mod actions;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod revalidate;
pub mod service;

pub use actions::ThreadActions;
pub use config::{AppConfig, DatabaseConfig};
pub use db::{ConnectionManager, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::community::{Community, CommunityId, CommunitySummary, NewCommunity};
pub use model::expanded::{ChildRef, CommunityRef, PostsPage, ThreadNode, UserRef};
pub use model::thread::{Thread, ThreadId};
pub use model::user::{NewUser, User, UserId, UserSummary};
pub use model::ValidationError;
pub use repo::{RepoError, RepoResult};
pub use revalidate::{FnRevalidator, LogRevalidator, PathRevalidator, RecordingRevalidator};
pub use service::thread_service::{CreateThreadParams, ThreadService, ThreadServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
