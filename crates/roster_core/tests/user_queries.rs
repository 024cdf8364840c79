use roster_core::db::open_db_in_memory;
use roster_core::{
    AgeBracket, SqliteUserRepository, User, UserFields, UserFilter, UserId, UserRepository,
};
use rusqlite::Connection;

fn insert(repo: &SqliteUserRepository<'_>, name: &str, email: &str, age: u8) -> User {
    repo.save(None, &UserFields::new(name, email, age)).unwrap()
}

fn ids(users: &[User]) -> Vec<UserId> {
    users.iter().map(|user| user.id).collect()
}

fn ages(users: &[User]) -> Vec<u8> {
    users.iter().map(|user| user.age).collect()
}

fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|user| user.name.as_str()).collect()
}

#[test]
fn find_all_returns_rows_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let first = insert(&repo, "Kim", "kim@test.com", 25);
    let second = insert(&repo, "Lee", "lee@test.com", 30);

    assert_eq!(ids(&repo.find_all().unwrap()), vec![first.id, second.id]);
}

#[test]
fn find_all_on_empty_store_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert!(repo.find_all().unwrap().is_empty());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn age_between_is_inclusive_on_both_ends() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    for (index, age) in [19, 20, 25, 29, 30].into_iter().enumerate() {
        insert(&repo, &format!("User {index}"), &format!("u{index}@test.com"), age);
    }

    let mut matched = ages(&repo.find_by_age_between(20, 29).unwrap());
    matched.sort_unstable();

    assert_eq!(matched, vec![20, 25, 29]);
}

#[test]
fn inverted_age_range_yields_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Kim", "kim@test.com", 25);

    assert!(repo.find_by_age_between(30, 20).unwrap().is_empty());
}

#[test]
fn age_range_ordered_sorts_ascending() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Old", "old@test.com", 40);
    insert(&repo, "Young", "young@test.com", 21);
    insert(&repo, "Middle", "middle@test.com", 33);
    insert(&repo, "Outside", "outside@test.com", 60);

    let ordered = repo.find_by_age_range_ordered(20, 50).unwrap();
    assert_eq!(ages(&ordered), vec![21, 33, 40]);
}

#[test]
fn name_containing_is_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Alice Kim", "alice@test.com", 25);
    insert(&repo, "alice lee", "alice.lee@test.com", 26);
    insert(&repo, "Bob", "bob@test.com", 27);

    let matched = repo.find_by_name_containing("Alice").unwrap();
    assert_eq!(names(&matched), vec!["Alice Kim"]);

    let ignoring_case = repo.find_by_name_containing_ignore_case("ALICE").unwrap();
    assert_eq!(names(&ignoring_case), vec!["Alice Kim", "alice lee"]);
}

#[test]
fn name_and_age_require_both_to_match() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Kim", "kim1@test.com", 25);
    insert(&repo, "Kim", "kim2@test.com", 30);

    let matched = repo.find_by_name_and_age("Kim", 25).unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].email, "kim1@test.com");
    assert_eq!(repo.count_by_name("Kim").unwrap(), 2);
}

#[test]
fn name_or_email_matches_either() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Kim", "kim@test.com", 25);
    insert(&repo, "Lee", "lee@test.com", 30);
    insert(&repo, "Park", "park@test.com", 35);

    let matched = repo.find_by_name_or_email("Kim", "park@test.com").unwrap();
    assert_eq!(names(&matched), vec!["Kim", "Park"]);
}

#[test]
fn adults_and_min_age_are_inclusive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Teen", "teen@test.com", 17);
    insert(&repo, "Adult", "adult@test.com", 18);
    insert(&repo, "Senior", "senior@test.com", 70);

    assert_eq!(ages(&repo.find_adults().unwrap()), vec![18, 70]);
    assert_eq!(ages(&repo.find_by_age_greater_or_equal(70).unwrap()), vec![70]);
}

#[test]
fn email_suffix_matches_whole_domain_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Kim", "kim@gmail.com", 25);
    insert(&repo, "Lee", "lee@notgmail.com", 26);
    insert(&repo, "Park", "park@naver.com", 27);

    let matched = repo.find_by_email_ending_with("@gmail.com").unwrap();
    assert_eq!(names(&matched), vec!["Kim"]);
    assert!(repo.find_by_email_ending_with("").unwrap().is_empty());
}

#[test]
fn phone_filter_skips_users_without_number() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.save(
        None,
        &UserFields::new("Kim", "kim@test.com", 25).with_phone_number("010-1234-5678"),
    )
    .unwrap();
    insert(&repo, "Lee", "lee@test.com", 26);

    let matched = repo.find_by_has_phone_number().unwrap();
    assert_eq!(names(&matched), vec!["Kim"]);
}

#[test]
fn sorted_projections_break_ties_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let charlie = insert(&repo, "Charlie", "charlie@test.com", 30);
    let alice = insert(&repo, "Alice", "alice@test.com", 25);
    let bob = insert(&repo, "Bob", "bob@test.com", 30);

    assert_eq!(
        ids(&repo.find_ordered_by_age_ascending().unwrap()),
        vec![alice.id, charlie.id, bob.id]
    );
    assert_eq!(
        names(&repo.find_ordered_by_name_descending().unwrap()),
        vec!["Charlie", "Bob", "Alice"]
    );
}

#[test]
fn age_statistics_group_by_decade_and_omit_empty_brackets() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Teen", "teen@test.com", 15);
    insert(&repo, "Twenty", "twenty@test.com", 25);
    insert(&repo, "Forty", "forty@test.com", 45);

    let stats = repo.count_by_age_bracket().unwrap();

    let present: Vec<AgeBracket> = stats.iter().map(|(bracket, _)| bracket).collect();
    assert_eq!(
        present,
        vec![AgeBracket::Teens, AgeBracket::Twenties, AgeBracket::Forties]
    );
    assert_eq!(stats.count(AgeBracket::Forties), 1);
    assert_eq!(stats.count(AgeBracket::Thirties), 0);
    assert_eq!(stats.total(), 3);
}

#[test]
fn age_statistics_fold_sixty_and_over() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Sixty", "sixty@test.com", 60);
    insert(&repo, "Hundred", "hundred@test.com", 100);
    insert(&repo, "Fifty Nine", "fiftynine@test.com", 59);

    let stats = repo.count_by_age_bracket().unwrap();

    assert_eq!(stats.count(AgeBracket::SixtiesAndOver), 2);
    assert_eq!(stats.count(AgeBracket::Fifties), 1);
}

#[test]
fn domain_statistics_order_by_count_then_domain() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "A1", "a1@naver.com", 20);
    insert(&repo, "G1", "g1@gmail.com", 21);
    insert(&repo, "G2", "g2@gmail.com", 22);
    insert(&repo, "E1", "e1@example.com", 23);

    let stats = repo.count_by_email_domain().unwrap();
    let ordered: Vec<(&str, u64)> = stats.iter().collect();

    assert_eq!(
        ordered,
        vec![("gmail.com", 2), ("example.com", 1), ("naver.com", 1)]
    );
    assert_eq!(stats.count("gmail.com"), 2);
}

#[test]
fn created_since_uses_inclusive_cutoff() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let old = insert(&repo, "Old", "old@test.com", 40);
    let fresh = insert(&repo, "Fresh", "fresh@test.com", 20);
    backdate(&conn, old.id, 1_000);
    backdate(&conn, fresh.id, 5_000);

    let cutoff = chrono::DateTime::from_timestamp_millis(5_000).unwrap();
    let matched = repo.find_created_since(cutoff).unwrap();

    assert_eq!(ids(&matched), vec![fresh.id]);
}

#[test]
fn count_matching_applies_filter() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "Kim", "kim@test.com", 25);
    insert(&repo, "Lee", "lee@test.com", 35);

    assert_eq!(
        repo.count_matching(&UserFilter::AgeAtLeast(30)).unwrap(),
        1
    );
    assert_eq!(repo.count().unwrap(), 2);
}

#[test]
fn find_by_email_is_exact() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let kim = insert(&repo, "Kim", "kim@test.com", 25);

    assert_eq!(repo.find_by_email("kim@test.com").unwrap(), Some(kim));
    assert!(repo.find_by_email("KIM@test.com").unwrap().is_none());
    assert!(repo.exists_by_email("kim@test.com").unwrap());
}

#[test]
fn ignore_case_search_folds_non_ascii_letters() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    insert(&repo, "ÉLODIE Martin", "elodie@test.com", 31);
    insert(&repo, "Ölaf Berg", "olaf@test.com", 42);

    let matched = repo.find_by_name_containing_ignore_case("élodie").unwrap();
    assert_eq!(names(&matched), vec!["ÉLODIE Martin"]);

    let matched = repo.find_by_name_containing_ignore_case("ÖLAF").unwrap();
    assert_eq!(names(&matched), vec!["Ölaf Berg"]);
    assert!(repo.find_by_name_containing("ölaf").unwrap().is_empty());
}

#[test]
fn age_statistics_agree_with_bracket_rule_at_every_edge() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let edges = [1u8, 19, 20, 29, 30, 39, 40, 49, 50, 59, 60, 150];
    for age in edges {
        insert(&repo, &format!("Age {age}"), &format!("age{age}@test.com"), age);
    }

    let stats = repo.count_by_age_bracket().unwrap();

    for bracket in AgeBracket::ALL {
        let expected = edges
            .iter()
            .filter(|age| AgeBracket::for_age(i64::from(**age)) == bracket)
            .count() as u64;
        assert_eq!(stats.count(bracket), expected, "{}", bracket.label());
    }
    assert_eq!(stats.total(), edges.len() as u64);
}

fn backdate(conn: &Connection, id: UserId, created_at_ms: i64) {
    conn.execute(
        "UPDATE users SET created_at = ?1, updated_at = ?1 WHERE id = ?2;",
        rusqlite::params![created_at_ms, id],
    )
    .unwrap();
}
