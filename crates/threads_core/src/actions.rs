//! Server-side action entry points.
//!
//! # Responsibility
//! - Make sure the store is connected before every operation.
//! - Build per-call repositories and services over the shared connection.
//!
//! # Invariants
//! - Each call holds the connection lock for its whole duration, so one
//!   action's transaction never interleaves with another's statements.
//! - Degraded mode (no connection string) surfaces as
//!   `StoreUnavailable(MissingConnectionString)` without touching storage.

use crate::db::ConnectionManager;
use crate::model::community::{Community, NewCommunity};
use crate::model::expanded::{PostsPage, ThreadNode};
use crate::model::thread::{Thread, ThreadId};
use crate::model::user::{NewUser, User, UserId};
use crate::repo::community_repo::SqliteCommunityRepository;
use crate::repo::thread_repo::SqliteThreadRepository;
use crate::repo::user_repo::SqliteUserRepository;
use crate::repo::RepoResult;
use crate::revalidate::PathRevalidator;
use crate::service::community_service::CommunityService;
use crate::service::thread_service::{CreateThreadParams, ThreadService, ThreadServiceError};
use crate::service::user_service::UserService;

/// Request-facing facade over the thread store.
pub struct ThreadActions<V: PathRevalidator> {
    connections: ConnectionManager,
    revalidator: V,
}

impl<V: PathRevalidator> ThreadActions<V> {
    pub fn new(connections: ConnectionManager, revalidator: V) -> Self {
        Self {
            connections,
            revalidator,
        }
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn revalidator(&self) -> &V {
        &self.revalidator
    }

    pub fn create_thread(&self, params: CreateThreadParams) -> Result<Thread, ThreadServiceError> {
        self.with_thread_service(|service| service.create_thread(params))
    }

    pub fn fetch_posts(&self, page: u32, page_size: u32) -> Result<PostsPage, ThreadServiceError> {
        self.with_thread_service(|service| service.fetch_posts(page, page_size))
    }

    pub fn fetch_thread_by_id(&self, id: ThreadId) -> Result<ThreadNode, ThreadServiceError> {
        self.with_thread_service(|service| service.fetch_thread_by_id(id))
    }

    pub fn add_comment_to_thread(
        &self,
        thread_id: ThreadId,
        comment_text: &str,
        user_id: UserId,
        path: &str,
    ) -> Result<Thread, ThreadServiceError> {
        self.with_thread_service(|service| {
            service.add_comment_to_thread(thread_id, comment_text, user_id, path)
        })
    }

    pub fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let conn = self.connections.ensure_connected()?;
        let service = UserService::new(SqliteUserRepository::try_new(&conn)?);
        service.create_user(user)
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let conn = self.connections.ensure_connected()?;
        let service = UserService::new(SqliteUserRepository::try_new(&conn)?);
        service.get_user(id)
    }

    pub fn create_community(&self, community: &NewCommunity) -> RepoResult<Community> {
        let conn = self.connections.ensure_connected()?;
        let service = CommunityService::new(SqliteCommunityRepository::try_new(&conn)?);
        service.create_community(community)
    }

    fn with_thread_service<'s, T, F>(&'s self, op: F) -> Result<T, ThreadServiceError>
    where
        F: FnOnce(&ThreadService<SqliteThreadRepository<'_>, &'s V>) -> Result<T, ThreadServiceError>,
    {
        let conn = self.connections.ensure_connected()?;
        let repo = SqliteThreadRepository::try_new(&conn)?;
        let service = ThreadService::new(repo, &self.revalidator);
        op(&service)
    }
}
