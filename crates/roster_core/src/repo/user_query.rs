//! Typed finder specifications and their SQL rendering.
//!
//! # Responsibility
//! - Describe every supported user lookup as data (`UserQuery`).
//! - Render a query into SQL text plus positional bind values.
//!
//! # Invariants
//! - Caller input only ever reaches SQLite as a bound parameter.
//! - Every rendered list query has a total order (ties broken by `id`).

use crate::db::FOLD_CASE_FN;
use crate::model::user::UserId;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;

pub(crate) const USER_COLUMNS: &str =
    "id, name, email, age, phone_number, address, created_at, updated_at";

/// Row filter of a user lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UserFilter {
    #[default]
    All,
    Id(UserId),
    /// Exact email match.
    Email(String),
    /// Exact name match.
    Name(String),
    /// Case-sensitive substring of `name`.
    NameContaining(String),
    /// Substring of `name`, Unicode lowercase folded.
    NameContainingIgnoreCase(String),
    NameAndAge { name: String, age: i64 },
    NameOrEmail { name: String, email: String },
    /// Inclusive on both ends.
    AgeBetween { min: i64, max: i64 },
    AgeAtLeast(i64),
    EmailEndingWith(String),
    HasPhoneNumber,
    /// `created_at` at or after the instant.
    CreatedSince(DateTime<Utc>),
}

/// Result ordering of a user lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserOrder {
    #[default]
    Id,
    AgeAscending,
    NameDescending,
}

/// Complete finder specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub filter: UserFilter,
    pub order: UserOrder,
}

impl UserQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matching(filter: UserFilter) -> Self {
        Self {
            filter,
            order: UserOrder::Id,
        }
    }

    pub fn ordered_by(mut self, order: UserOrder) -> Self {
        self.order = order;
        self
    }
}

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Renders a `SELECT` returning full user rows.
pub(crate) fn render_select(query: &UserQuery) -> RenderedQuery {
    let mut sql = format!("SELECT {USER_COLUMNS} FROM users");
    let mut params = Vec::new();
    push_filter(&mut sql, &mut params, &query.filter);
    sql.push_str(match query.order {
        UserOrder::Id => " ORDER BY id ASC",
        UserOrder::AgeAscending => " ORDER BY age ASC, id ASC",
        UserOrder::NameDescending => " ORDER BY name DESC, id ASC",
    });
    RenderedQuery { sql, params }
}

/// Renders a `SELECT COUNT(*)` over the rows matching `filter`.
pub(crate) fn render_count(filter: &UserFilter) -> RenderedQuery {
    let mut sql = String::from("SELECT COUNT(*) FROM users");
    let mut params = Vec::new();
    push_filter(&mut sql, &mut params, filter);
    RenderedQuery { sql, params }
}

fn push_filter(sql: &mut String, params: &mut Vec<Value>, filter: &UserFilter) {
    match filter {
        UserFilter::All => {}
        UserFilter::Id(id) => {
            sql.push_str(" WHERE id = ?");
            params.push(Value::Integer(*id));
        }
        UserFilter::Email(email) => {
            sql.push_str(" WHERE email = ?");
            params.push(text(email));
        }
        UserFilter::Name(name) => {
            sql.push_str(" WHERE name = ?");
            params.push(text(name));
        }
        UserFilter::NameContaining(fragment) => {
            // instr() is case-sensitive; LIKE would fold ASCII case.
            sql.push_str(" WHERE instr(name, ?) > 0");
            params.push(text(fragment));
        }
        UserFilter::NameContainingIgnoreCase(fragment) => {
            sql.push_str(&format!(" WHERE instr({FOLD_CASE_FN}(name), ?) > 0"));
            params.push(text(&fragment.to_lowercase()));
        }
        UserFilter::NameAndAge { name, age } => {
            sql.push_str(" WHERE name = ? AND age = ?");
            params.push(text(name));
            params.push(Value::Integer(*age));
        }
        UserFilter::NameOrEmail { name, email } => {
            sql.push_str(" WHERE (name = ? OR email = ?)");
            params.push(text(name));
            params.push(text(email));
        }
        UserFilter::AgeBetween { min, max } => {
            sql.push_str(" WHERE age BETWEEN ? AND ?");
            params.push(Value::Integer(*min));
            params.push(Value::Integer(*max));
        }
        UserFilter::AgeAtLeast(age) => {
            sql.push_str(" WHERE age >= ?");
            params.push(Value::Integer(*age));
        }
        UserFilter::EmailEndingWith(suffix) => {
            sql.push_str(" WHERE length(?) > 0 AND substr(email, -length(?)) = ?");
            params.push(text(suffix));
            params.push(text(suffix));
            params.push(text(suffix));
        }
        UserFilter::HasPhoneNumber => {
            sql.push_str(" WHERE phone_number IS NOT NULL");
        }
        UserFilter::CreatedSince(instant) => {
            sql.push_str(" WHERE created_at >= ?");
            params.push(Value::Integer(instant.timestamp_millis()));
        }
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_owned())
}
