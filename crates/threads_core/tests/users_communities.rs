use threads_core::db::open_db_in_memory;
use threads_core::repo::community_repo::{CommunityRepository, SqliteCommunityRepository};
use threads_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use threads_core::service::community_service::CommunityService;
use threads_core::service::user_service::UserService;
use threads_core::{NewCommunity, NewUser, RepoError, ValidationError};
use uuid::Uuid;

#[test]
fn user_roundtrip_keeps_caller_id_and_profile() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let external_id = Uuid::new_v4();
    let mut input = NewUser::new("dana", "Dana");
    input.id = Some(external_id);
    input.bio = Some("writes parsers".to_string());
    let created = service.create_user(&input).unwrap();

    assert_eq!(created.id, external_id);
    let loaded = service.get_user(external_id).unwrap().unwrap();
    assert_eq!(loaded.bio.as_deref(), Some("writes parsers"));
    assert!(loaded.threads.is_empty());
}

#[test]
fn invalid_handle_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo.create_user(&NewUser::new("no spaces", "X")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidHandle(_))
    ));
}

#[test]
fn thread_list_of_unknown_user_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let ghost = Uuid::new_v4();
    assert!(matches!(
        service.list_user_threads(ghost).unwrap_err(),
        RepoError::UserNotFound(id) if id == ghost
    ));
    assert!(service.get_user(ghost).unwrap().is_none());
}

#[test]
fn community_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let service = CommunityService::new(SqliteCommunityRepository::try_new(&conn).unwrap());

    let created = service
        .create_community(&NewCommunity::new("rust", "Rust"))
        .unwrap();
    let loaded = service.get_community(created.id).unwrap().unwrap();
    assert_eq!(loaded.name, "Rust");
    assert_eq!(loaded.image, None);

    let repo = SqliteCommunityRepository::try_new(&conn).unwrap();
    assert!(repo.get_community(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteUserRepository::try_new(&conn).err(),
        Some(RepoError::UninitializedConnection { actual_version: 0, .. })
    ));
}
