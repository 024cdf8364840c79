use roster_core::db::open_db_in_memory;
use roster_core::{RepoError, SqliteUserRepository, UserFields, UserRepository};
use rusqlite::Connection;

fn kim() -> UserFields {
    UserFields::new("Kim", "kim@test.com", 25)
}

#[test]
fn save_without_id_inserts_and_assigns_identity() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let created = repo.save(None, &kim()).unwrap();

    assert!(created.id > 0);
    assert_eq!(created.fields(), kim());
    assert_eq!(created.created_at, created.updated_at);
}

#[test]
fn create_and_get_roundtrip_preserves_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let fields = UserFields::new("Park Minsu", "park@gmail.com", 22)
        .with_phone_number("010-3456-7890")
        .with_address("Busan Haeundae-gu");
    let created = repo.save(None, &fields).unwrap();

    let loaded = repo.find_by_id(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.name, "Park Minsu");
    assert_eq!(loaded.email, "park@gmail.com");
    assert_eq!(loaded.age, 22);
    assert_eq!(loaded.phone_number.as_deref(), Some("010-3456-7890"));
    assert_eq!(loaded.address.as_deref(), Some("Busan Haeundae-gu"));
}

#[test]
fn find_by_id_returns_none_for_missing_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert!(repo.find_by_id(42).unwrap().is_none());
}

#[test]
fn save_with_id_replaces_fields_and_keeps_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let created = repo.save(None, &kim()).unwrap();
    conn.execute(
        "UPDATE users SET created_at = 1000, updated_at = 1000 WHERE id = ?1;",
        [created.id],
    )
    .unwrap();

    let replacement = UserFields::new("Kim Updated", "kim.new@test.com", 26).with_address("Seoul");
    let updated = repo.save(Some(created.id), &replacement).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.fields(), replacement);
    assert_eq!(updated.created_at.timestamp_millis(), 1000);
    assert!(updated.updated_at > updated.created_at);
}

#[test]
fn save_with_missing_id_returns_not_found_and_inserts_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo.save(Some(7), &kim()).unwrap_err();

    assert!(matches!(err, RepoError::NotFound(7)));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn unique_constraint_surfaces_as_duplicate_email() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.save(None, &kim()).unwrap();
    let err = repo
        .save(None, &UserFields::new("Other Kim", "kim@test.com", 40))
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateEmail(ref email) if email == "kim@test.com"));
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn replace_onto_taken_email_is_rejected_by_the_table() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.save(None, &kim()).unwrap();
    let lee = repo
        .save(None, &UserFields::new("Lee", "lee@test.com", 28))
        .unwrap();

    let err = repo
        .save(Some(lee.id), &UserFields::new("Lee", "kim@test.com", 28))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateEmail(_)));
    assert_eq!(
        repo.find_by_id(lee.id).unwrap().unwrap().email,
        "lee@test.com"
    );
}

#[test]
fn delete_then_find_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let created = repo.save(None, &kim()).unwrap();
    repo.delete_by_id(created.id).unwrap();

    assert!(repo.find_by_id(created.id).unwrap().is_none());
    assert!(!repo.exists_by_email("kim@test.com").unwrap());
}

#[test]
fn delete_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo.delete_by_id(99).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(99)));
}

#[test]
fn identifiers_are_never_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let first = repo.save(None, &kim()).unwrap();
    repo.delete_by_id(first.id).unwrap();
    let second = repo.save(None, &kim()).unwrap();

    assert!(second.id > first.id);
}

#[test]
fn validation_failure_blocks_writes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let invalid = UserFields::new("K", "no-at-sign", 0);
    let err = repo.save(None, &invalid).unwrap_err();

    match err {
        RepoError::Validation(errors) => assert_eq!(errors.violations().len(), 3),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn invalid_persisted_row_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let created = repo.save(None, &kim()).unwrap();
    // Bypass the CHECK constraints to simulate a corrupted row.
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute("UPDATE users SET age = 400 WHERE id = ?1;", [created.id])
        .unwrap();

    let err = repo.find_by_id(created.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn atomically_rolls_back_on_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let result: Result<(), RepoError> = repo.atomically(|repo| {
        repo.save(None, &kim())?;
        Err(RepoError::InvalidData("abort".to_string()))
    });

    assert!(result.is_err());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteUserRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::Db(_)));
}
