//! Community use-case service.

use crate::model::community::{Community, CommunityId, NewCommunity};
use crate::repo::community_repo::CommunityRepository;
use crate::repo::RepoResult;
use log::info;

pub struct CommunityService<R: CommunityRepository> {
    repo: R,
}

impl<R: CommunityRepository> CommunityService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_community(&self, community: &NewCommunity) -> RepoResult<Community> {
        let created = self.repo.create_community(community)?;
        info!(
            "event=community_create module=service status=ok community_id={}",
            created.id
        );
        Ok(created)
    }

    pub fn get_community(&self, id: CommunityId) -> RepoResult<Option<Community>> {
        self.repo.get_community(id)
    }
}
