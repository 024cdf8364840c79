//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and finder APIs over the `users` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `UserFields::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - A `UNIQUE(email)` violation always surfaces as `DuplicateEmail`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::stats::{AgeBracket, AgeStatistics, DomainStatistics};
use crate::model::user::{User, UserFields, UserId, UserValidationErrors, ADULT_AGE};
use crate::repo::user_query::{
    render_count, render_select, UserFilter, UserOrder, UserQuery, USER_COLUMNS,
};
use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const AGE_BRACKET_SQL: &str = "SELECT
    CASE
        WHEN age < 20 THEN 0
        WHEN age < 30 THEN 1
        WHEN age < 40 THEN 2
        WHEN age < 50 THEN 3
        WHEN age < 60 THEN 4
        ELSE 5
    END AS bracket,
    COUNT(*) AS user_count
FROM users
GROUP BY bracket
ORDER BY bracket ASC";

const EMAIL_DOMAIN_SQL: &str = "SELECT
    substr(email, instr(email, '@') + 1) AS domain,
    COUNT(*) AS user_count
FROM users
WHERE instr(email, '@') > 0
GROUP BY domain
ORDER BY user_count DESC, domain ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(UserValidationErrors),
    Db(DbError),
    NotFound(UserId),
    /// Another row already holds this email.
    DuplicateEmail(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "email already exists: {email}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateEmail(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<UserValidationErrors> for RepoError {
    fn from(value: UserValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for user persistence.
///
/// Implementors provide the primitive operations; named finders are derived
/// from `find` / `count_matching` with a `UserQuery`.
pub trait UserRepository {
    /// Runs a finder specification.
    fn find(&self, query: &UserQuery) -> RepoResult<Vec<User>>;
    /// Counts rows matching `filter`.
    fn count_matching(&self, filter: &UserFilter) -> RepoResult<u64>;
    /// Never errors for a missing id.
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    fn exists_by_email(&self, email: &str) -> RepoResult<bool>;
    /// Inserts when `id` is `None`, otherwise replaces the row with that id.
    ///
    /// Returns the persisted row with id and timestamps populated. Replacing
    /// a missing id returns `NotFound` and inserts nothing.
    fn save(&self, id: Option<UserId>, fields: &UserFields) -> RepoResult<User>;
    /// Removes one row; returns `NotFound` when nothing was removed.
    fn delete_by_id(&self, id: UserId) -> RepoResult<()>;
    fn count_by_age_bracket(&self) -> RepoResult<AgeStatistics>;
    fn count_by_email_domain(&self) -> RepoResult<DomainStatistics>;
    /// Runs `op` in one transaction: commit on `Ok`, roll back on `Err`.
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        Self: Sized,
        E: From<RepoError>,
        F: FnOnce(&Self) -> Result<T, E>;

    fn find_all(&self) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::all())
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        first(self.find(&UserQuery::matching(UserFilter::Email(email.to_owned())))?)
    }

    fn find_by_name_containing(&self, fragment: &str) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::NameContaining(
            fragment.to_owned(),
        )))
    }

    fn find_by_name_containing_ignore_case(&self, fragment: &str) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::NameContainingIgnoreCase(
            fragment.to_owned(),
        )))
    }

    fn find_by_name_and_age(&self, name: &str, age: i64) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::NameAndAge {
            name: name.to_owned(),
            age,
        }))
    }

    fn find_by_name_or_email(&self, name: &str, email: &str) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::NameOrEmail {
            name: name.to_owned(),
            email: email.to_owned(),
        }))
    }

    fn find_by_age_between(&self, min: i64, max: i64) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::AgeBetween { min, max }))
    }

    fn find_by_age_range_ordered(&self, min: i64, max: i64) -> RepoResult<Vec<User>> {
        self.find(
            &UserQuery::matching(UserFilter::AgeBetween { min, max })
                .ordered_by(UserOrder::AgeAscending),
        )
    }

    fn find_by_age_greater_or_equal(&self, age: i64) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::AgeAtLeast(age)))
    }

    fn find_adults(&self) -> RepoResult<Vec<User>> {
        self.find_by_age_greater_or_equal(i64::from(ADULT_AGE))
    }

    fn find_by_email_ending_with(&self, suffix: &str) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::EmailEndingWith(
            suffix.to_owned(),
        )))
    }

    fn find_by_has_phone_number(&self) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::HasPhoneNumber))
    }

    fn find_created_since(&self, instant: DateTime<Utc>) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::matching(UserFilter::CreatedSince(instant)))
    }

    fn find_ordered_by_age_ascending(&self) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::all().ordered_by(UserOrder::AgeAscending))
    }

    fn find_ordered_by_name_descending(&self) -> RepoResult<Vec<User>> {
        self.find(&UserQuery::all().ordered_by(UserOrder::NameDescending))
    }

    fn count(&self) -> RepoResult<u64> {
        self.count_matching(&UserFilter::All)
    }

    fn count_by_name(&self, name: &str) -> RepoResult<u64> {
        self.count_matching(&UserFilter::Name(name.to_owned()))
    }
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Wraps a connection whose schema is at the latest migration.
    ///
    /// # Errors
    /// - `RepoError::Db(DbError::SchemaNotMigrated)` for connections that
    ///   were not opened through `open_db` / `open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let db_version = current_user_version(conn)?;
        let expected = latest_version();
        if db_version != expected {
            return Err(DbError::SchemaNotMigrated {
                db_version,
                expected,
            }
            .into());
        }
        Ok(Self { conn })
    }

    fn insert(&self, fields: &UserFields, now_ms: i64) -> RepoResult<User> {
        let result = self.conn.execute(
            "INSERT INTO users (
                name,
                email,
                age,
                phone_number,
                address,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
            params![
                fields.name.as_str(),
                fields.email.as_str(),
                fields.age,
                fields.phone_number.as_deref(),
                fields.address.as_deref(),
                now_ms,
            ],
        );
        map_write_result(result, &fields.email)?;

        let id = self.conn.last_insert_rowid();
        self.find_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted user {id} missing on read-back"))
        })
    }

    fn replace(&self, id: UserId, fields: &UserFields, now_ms: i64) -> RepoResult<User> {
        // max() keeps created_at <= updated_at even if the wall clock steps back.
        let result = self.conn.execute(
            "UPDATE users
             SET
                name = ?1,
                email = ?2,
                age = ?3,
                phone_number = ?4,
                address = ?5,
                updated_at = max(created_at, ?6)
             WHERE id = ?7;",
            params![
                fields.name.as_str(),
                fields.email.as_str(),
                fields.age,
                fields.phone_number.as_deref(),
                fields.address.as_deref(),
                now_ms,
                id,
            ],
        );
        let changed = map_write_result(result, &fields.email)?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.find_by_id(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("updated user {id} missing on read-back")))
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn find(&self, query: &UserQuery) -> RepoResult<Vec<User>> {
        let rendered = render_select(query);
        let mut stmt = self.conn.prepare(&rendered.sql)?;
        let mut rows = stmt.query(params_from_iter(rendered.params))?;
        let mut users = Vec::new();

        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }

        Ok(users)
    }

    fn count_matching(&self, filter: &UserFilter) -> RepoResult<u64> {
        let rendered = render_count(filter);
        let count: i64 = self.conn.query_row(
            &rendered.sql,
            params_from_iter(rendered.params),
            |row| row.get(0),
        )?;
        to_count(count, "COUNT(*)")
    }

    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM users WHERE email = ?1 LIMIT 1;",
                [email],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    fn save(&self, id: Option<UserId>, fields: &UserFields) -> RepoResult<User> {
        fields.validate()?;

        let now_ms = Utc::now().timestamp_millis();
        match id {
            None => self.insert(fields, now_ms),
            Some(id) => self.replace(id, fields, now_ms),
        }
    }

    fn delete_by_id(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn count_by_age_bracket(&self) -> RepoResult<AgeStatistics> {
        let mut stmt = self.conn.prepare(AGE_BRACKET_SQL)?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();

        while let Some(row) = rows.next()? {
            let ordinal: i64 = row.get("bracket")?;
            let bracket = AgeBracket::from_ordinal(ordinal).ok_or_else(|| {
                RepoError::InvalidData(format!("unknown age bracket ordinal `{ordinal}`"))
            })?;
            counts.push((bracket, to_count(row.get("user_count")?, "user_count")?));
        }

        Ok(AgeStatistics::from_counts(counts))
    }

    fn count_by_email_domain(&self) -> RepoResult<DomainStatistics> {
        let mut stmt = self.conn.prepare(EMAIL_DOMAIN_SQL)?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();

        while let Some(row) = rows.next()? {
            let domain: String = row.get("domain")?;
            counts.push((domain, to_count(row.get("user_count")?, "user_count")?));
        }

        Ok(DomainStatistics::from_ordered(counts))
    }

    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(RepoError::from)?;
        // Dropping `tx` on the error path rolls back.
        let value = op(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn map_write_result(result: rusqlite::Result<usize>, email: &str) -> RepoResult<usize> {
    match result {
        Ok(changed) => Ok(changed),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Err(RepoError::DuplicateEmail(email.to_owned()))
        }
        Err(err) => Err(err.into()),
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id: UserId = row.get("id")?;

    let age_value: i64 = row.get("age")?;
    let age = u8::try_from(age_value).map_err(|_| {
        RepoError::InvalidData(format!("invalid age `{age_value}` in users.age for id {id}"))
    })?;

    let user = User {
        id,
        name: row.get("name")?,
        email: row.get("email")?,
        age,
        phone_number: row.get("phone_number")?,
        address: row.get("address")?,
        created_at: parse_timestamp(row.get("created_at")?, "created_at", id)?,
        updated_at: parse_timestamp(row.get("updated_at")?, "updated_at", id)?,
    };
    user.validate()?;
    Ok(user)
}

fn parse_timestamp(value: i64, column: &str, id: UserId) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{value}` in users.{column} for id {id}"
        ))
    })
}

fn to_count(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative count `{value}` in {column}")))
}

fn first(users: Vec<User>) -> RepoResult<Option<User>> {
    Ok(users.into_iter().next())
}
