use rusqlite::Connection;
use threads_core::db::open_db_in_memory;
use threads_core::repo::thread_repo::{SqliteThreadRepository, ThreadRepository};
use threads_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use threads_core::{
    CreateThreadParams, NewUser, RecordingRevalidator, ThreadService, ThreadServiceError, User,
    ValidationError,
};
use uuid::Uuid;

fn create_user(conn: &Connection, username: &str) -> User {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    repo.create_user(&NewUser::new(username, format!("{username} name")))
        .unwrap()
}

fn params(author: Uuid, text: &str) -> CreateThreadParams {
    CreateThreadParams {
        text: text.to_string(),
        author,
        community_id: None,
        path: "/".to_string(),
    }
}

fn thread_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM threads;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_thread_stores_root_and_links_author() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);

    let mut input = params(alice.id, "hello board");
    input.community_id = Some(Uuid::new_v4());
    let created = service.create_thread(input).unwrap();

    let stored = service.get_thread(created.id).unwrap().unwrap();
    assert_eq!(stored.text, "hello board");
    assert_eq!(stored.author, alice.id);
    assert_eq!(stored.parent_id, None);
    assert_eq!(stored.community, None);
    assert!(stored.children.is_empty());
    assert!(stored.created_at > 0);

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let reloaded = users.get_user(alice.id).unwrap().unwrap();
    assert_eq!(reloaded.threads, vec![created.id]);
    assert_eq!(recorder.paths(), vec!["/".to_string()]);
}

#[test]
fn author_thread_list_keeps_push_order() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);

    let first = service.create_thread(params(alice.id, "first")).unwrap();
    let second = service.create_thread(params(alice.id, "second")).unwrap();

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    assert_eq!(
        users.list_user_threads(alice.id).unwrap(),
        vec![first.id, second.id]
    );
}

#[test]
fn blank_text_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);

    let err = service.create_thread(params(alice.id, "   ")).unwrap_err();
    assert!(matches!(
        err,
        ThreadServiceError::ValidationFailed(ValidationError::EmptyText)
    ));
    assert_eq!(thread_count(&conn), 0);
    assert!(recorder.paths().is_empty());
}

#[test]
fn unknown_author_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);

    let ghost = Uuid::new_v4();
    let err = service.create_thread(params(ghost, "boo")).unwrap_err();
    assert!(matches!(err, ThreadServiceError::AuthorNotFound(id) if id == ghost));
    assert_eq!(thread_count(&conn), 0);
}

#[test]
fn blank_path_skips_revalidation() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);

    let mut input = params(alice.id, "quiet");
    input.path = "  ".to_string();
    service.create_thread(input).unwrap();

    assert!(recorder.paths().is_empty());
}

#[test]
fn add_comment_links_reply_under_parent() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let bob = create_user(&conn, "bob");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);

    let root = service.create_thread(params(alice.id, "root")).unwrap();
    let first = service
        .add_comment_to_thread(root.id, "first reply", bob.id, "/thread/1")
        .unwrap();
    let second = service
        .add_comment_to_thread(root.id, "second reply", alice.id, "/thread/1")
        .unwrap();

    assert_eq!(first.parent_id, Some(root.id));
    assert_eq!(first.author, bob.id);
    assert_eq!(first.text, "first reply");

    let parent = service.get_thread(root.id).unwrap().unwrap();
    assert_eq!(parent.children, vec![first.id, second.id]);

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    assert!(users.list_user_threads(bob.id).unwrap().is_empty());
    assert_eq!(users.list_user_threads(alice.id).unwrap(), vec![root.id]);

    assert_eq!(
        recorder.paths(),
        vec!["/".to_string(), "/thread/1".to_string(), "/thread/1".to_string()]
    );
}

#[test]
fn add_comment_to_missing_thread_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let bob = create_user(&conn, "bob");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);

    let missing = Uuid::new_v4();
    let err = service
        .add_comment_to_thread(missing, "anyone there?", bob.id, "/thread/x")
        .unwrap_err();

    assert!(matches!(err, ThreadServiceError::NotFound(id) if id == missing));
    assert!(err.to_string().contains("Thread not found"));
    assert_eq!(thread_count(&conn), 0);
    assert!(recorder.paths().is_empty());
}

#[test]
fn add_comment_rejects_blank_text_and_unknown_user() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);
    let root = service.create_thread(params(alice.id, "root")).unwrap();

    let err = service
        .add_comment_to_thread(root.id, "\n", alice.id, "/t")
        .unwrap_err();
    assert!(matches!(err, ThreadServiceError::ValidationFailed(_)));

    let ghost = Uuid::new_v4();
    let err = service
        .add_comment_to_thread(root.id, "hi", ghost, "/t")
        .unwrap_err();
    assert!(matches!(err, ThreadServiceError::AuthorNotFound(id) if id == ghost));

    assert_eq!(thread_count(&conn), 1);
    assert!(service.get_thread(root.id).unwrap().unwrap().children.is_empty());
}

#[test]
fn failed_child_link_rolls_back_reply_row() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);
    let root = service.create_thread(params(alice.id, "root")).unwrap();

    conn.execute_batch(
        "CREATE TRIGGER block_child_links BEFORE INSERT ON thread_children
         BEGIN SELECT RAISE(ABORT, 'child links blocked'); END;",
    )
    .unwrap();

    let err = service
        .add_comment_to_thread(root.id, "doomed", alice.id, "/t")
        .unwrap_err();
    assert!(matches!(err, ThreadServiceError::StoreUnavailable(_)));

    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM threads WHERE parent_uuid = ?1;",
            [root.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
    assert_eq!(recorder.paths(), vec!["/".to_string()]);
}

#[test]
fn failed_author_link_rolls_back_root_row() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let recorder = RecordingRevalidator::new();
    let service = ThreadService::new(SqliteThreadRepository::try_new(&conn).unwrap(), &recorder);

    conn.execute_batch(
        "CREATE TRIGGER block_user_links BEFORE INSERT ON user_threads
         BEGIN SELECT RAISE(ABORT, 'user links blocked'); END;",
    )
    .unwrap();

    assert!(service.create_thread(params(alice.id, "doomed")).is_err());
    assert_eq!(thread_count(&conn), 0);
}

#[test]
fn repository_rejects_reply_passed_as_root() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let repo = SqliteThreadRepository::try_new(&conn).unwrap();

    let reply = threads_core::Thread::new_reply(Uuid::new_v4(), alice.id, "misfiled");
    assert!(repo.create_root_thread(&reply).is_err());
    assert_eq!(thread_count(&conn), 0);
}
