//! User use-case service.

use crate::model::thread::ThreadId;
use crate::model::user::{NewUser, User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use log::info;

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a user. The handle must be unique.
    pub fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let created = self.repo.create_user(user)?;
        info!("event=user_create module=service status=ok user_id={}", created.id);
        Ok(created)
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo.get_user(id)
    }

    /// Root posts authored by `id`, oldest push first.
    pub fn list_user_threads(&self, id: UserId) -> RepoResult<Vec<ThreadId>> {
        self.repo.list_user_threads(id)
    }
}
