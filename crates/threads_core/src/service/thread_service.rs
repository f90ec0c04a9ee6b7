//! Thread use-case service.
//!
//! # Responsibility
//! - Provide create/list/detail/reply use-cases over [`ThreadRepository`].
//! - Own the expansion shapes used by list and detail pages.
//! - Signal cache revalidation after committed writes.
//!
//! # Invariants
//! - Created posts are always root posts with no community.
//! - Replies are linked from their parent's `children` in the same commit.
//! - Revalidation runs only after a successful write, and only for a
//!   non-blank path.
//! - Failures keep their kind: not-found, validation and store errors are
//!   distinct variants.

use crate::db::DbError;
use crate::model::community::CommunityId;
use crate::model::expanded::{PostsPage, ThreadNode};
use crate::model::thread::{validate_text, Thread, ThreadId};
use crate::model::user::UserId;
use crate::model::ValidationError;
use crate::repo::populate::{CommunitySelect, ThreadPopulate, UserSelect};
use crate::repo::thread_repo::{RootThreadQuery, ThreadRepository};
use crate::repo::RepoError;
use crate::revalidate::PathRevalidator;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const PAGE_SIZE_MAX: u32 = 100;

/// Service error for thread use-cases.
#[derive(Debug)]
pub enum ThreadServiceError {
    /// Target thread does not exist.
    NotFound(ThreadId),
    /// Author/commenter user does not exist.
    AuthorNotFound(UserId),
    /// Input rejected before any write.
    ValidationFailed(ValidationError),
    /// Store could not be reached or failed mid-operation.
    StoreUnavailable(DbError),
    /// Other persistence-layer failure (schema mismatch, corrupt rows).
    Repo(RepoError),
}

impl Display for ThreadServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Thread not found: {id}"),
            Self::AuthorNotFound(id) => write!(f, "author not found: {id}"),
            Self::ValidationFailed(err) => write!(f, "{err}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ThreadServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ValidationFailed(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::AuthorNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ThreadServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ThreadNotFound(id) => Self::NotFound(id),
            RepoError::UserNotFound(id) => Self::AuthorNotFound(id),
            RepoError::Validation(err) => Self::ValidationFailed(err),
            RepoError::Db(err) => Self::StoreUnavailable(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for ThreadServiceError {
    fn from(value: DbError) -> Self {
        Self::StoreUnavailable(value)
    }
}

impl From<ValidationError> for ThreadServiceError {
    fn from(value: ValidationError) -> Self {
        Self::ValidationFailed(value)
    }
}

impl ThreadServiceError {
    /// Stable machine-readable code for logs and transport mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "thread_not_found",
            Self::AuthorNotFound(_) => "author_not_found",
            Self::ValidationFailed(_) => "validation_failed",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Repo(_) => "repo_error",
        }
    }
}

/// Input for creating a root post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateThreadParams {
    pub text: String,
    pub author: UserId,
    /// Accepted for call-site compatibility; posts are stored without a
    /// community.
    pub community_id: Option<CommunityId>,
    /// Route to revalidate after the write.
    pub path: String,
}

/// Thread service facade over repository implementations.
pub struct ThreadService<R: ThreadRepository, V: PathRevalidator> {
    repo: R,
    revalidator: V,
}

impl<R: ThreadRepository, V: PathRevalidator> ThreadService<R, V> {
    pub fn new(repo: R, revalidator: V) -> Self {
        Self { repo, revalidator }
    }

    /// Creates one root post and links it onto the author's thread list.
    pub fn create_thread(&self, params: CreateThreadParams) -> Result<Thread, ThreadServiceError> {
        let started_at = Instant::now();
        let result = self.create_thread_inner(params);
        log_outcome("thread_create", started_at, &result);
        result
    }

    fn create_thread_inner(&self, params: CreateThreadParams) -> Result<Thread, ThreadServiceError> {
        validate_text(&params.text)?;
        if params.community_id.is_some() {
            debug!("event=thread_create module=service community_ignored=true");
        }
        if !self.repo.author_exists(params.author)? {
            return Err(ThreadServiceError::AuthorNotFound(params.author));
        }

        let thread = Thread::new_root(params.author, params.text);
        let created = self.repo.create_root_thread(&thread)?;
        self.revalidate(&params.path);
        Ok(created)
    }

    /// Lists one page of root posts, newest first.
    ///
    /// `page` is 1-based; `0` is treated as the first page. `page_size`
    /// defaults to 20 when `0` and is capped at 100.
    pub fn fetch_posts(&self, page: u32, page_size: u32) -> Result<PostsPage, ThreadServiceError> {
        let started_at = Instant::now();
        let page = page.max(DEFAULT_PAGE);
        let limit = normalize_page_size(page_size);
        let offset = (page - 1).saturating_mul(limit);

        let result = self.list_page(RootThreadQuery { limit, offset });

        if let Ok(page_result) = &result {
            debug!(
                "event=thread_list module=service page={page} page_size={limit} returned={} has_next={}",
                page_result.posts.len(),
                page_result.has_next
            );
        }
        log_outcome("thread_list", started_at, &result);
        result
    }

    fn list_page(&self, query: RootThreadQuery) -> Result<PostsPage, ThreadServiceError> {
        let posts = self.repo.list_root_threads(&query, &list_shape())?;
        let total = self.repo.count_root_threads()?;
        let has_next = total > u64::from(query.offset) + posts.len() as u64;
        Ok(PostsPage { posts, has_next })
    }

    /// Loads one thread with two levels of replies and their authors.
    pub fn fetch_thread_by_id(&self, id: ThreadId) -> Result<ThreadNode, ThreadServiceError> {
        let started_at = Instant::now();
        let result = self
            .repo
            .find_thread(id, &detail_shape())
            .map_err(ThreadServiceError::from)
            .and_then(|node| node.ok_or(ThreadServiceError::NotFound(id)));
        log_outcome("thread_fetch", started_at, &result);
        result
    }

    /// Appends a reply by `user_id` to thread `thread_id`.
    pub fn add_comment_to_thread(
        &self,
        thread_id: ThreadId,
        comment_text: impl Into<String>,
        user_id: UserId,
        path: &str,
    ) -> Result<Thread, ThreadServiceError> {
        let started_at = Instant::now();
        let result = self.add_comment_inner(thread_id, comment_text.into(), user_id, path);
        log_outcome("thread_reply", started_at, &result);
        result
    }

    fn add_comment_inner(
        &self,
        thread_id: ThreadId,
        comment_text: String,
        user_id: UserId,
        path: &str,
    ) -> Result<Thread, ThreadServiceError> {
        if self.repo.get_thread(thread_id)?.is_none() {
            return Err(ThreadServiceError::NotFound(thread_id));
        }
        validate_text(&comment_text)?;
        if !self.repo.author_exists(user_id)? {
            return Err(ThreadServiceError::AuthorNotFound(user_id));
        }

        let reply = Thread::new_reply(thread_id, user_id, comment_text);
        let saved = self.repo.create_reply(&reply)?;
        self.revalidate(path);
        Ok(saved)
    }

    /// Loads one stored thread without expansion.
    pub fn get_thread(&self, id: ThreadId) -> Result<Option<Thread>, ThreadServiceError> {
        self.repo.get_thread(id).map_err(Into::into)
    }

    fn revalidate(&self, path: &str) {
        let path = path.trim();
        if path.is_empty() {
            return;
        }
        self.revalidator.revalidate_path(path);
    }
}

/// List page shape: full author and community, one level of replies with
/// author summaries.
pub fn list_shape() -> ThreadPopulate {
    ThreadPopulate::none()
        .author(UserSelect::Full)
        .community(CommunitySelect::Full)
        .children(ThreadPopulate::none().author(UserSelect::Summary))
}

/// Detail page shape: community summary, replies and replies-of-replies
/// with author summaries. The post's own author stays a raw id.
pub fn detail_shape() -> ThreadPopulate {
    ThreadPopulate::none()
        .community(CommunitySelect::Summary)
        .children(
            ThreadPopulate::none()
                .author(UserSelect::Summary)
                .children(ThreadPopulate::none().author(UserSelect::Summary)),
        )
}

/// Normalizes page size according to list contract.
pub fn normalize_page_size(page_size: u32) -> u32 {
    match page_size {
        0 => DEFAULT_PAGE_SIZE,
        value if value > PAGE_SIZE_MAX => PAGE_SIZE_MAX,
        value => value,
    }
}

fn log_outcome<T>(event: &str, started_at: Instant, result: &Result<T, ThreadServiceError>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
        Err(err) => error!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
    }
}
