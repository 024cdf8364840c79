//! Users API handlers.
//!
//! ```text
//! POST /api/users {"name":"Kim","email":"kim@test.com","age":25}
//! GET /api/users/search/age?minAge=20&maxAge=29
//! ```
//!
//! Identifier routes only match digits, so they never shadow the fixed
//! segments such as `/count` or `/statistics`.

use crate::error::{Action, ApiError, ApiResult};
use crate::state::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse};
use roster_core::{
    AgeStatistics, DomainStatistics, User, UserDraft, UserId, DEFAULT_RECENT_DAYS,
};
use serde::{Deserialize, Serialize};

type Users = ApiResult<web::Json<Vec<User>>>;

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRangeQuery {
    pub min_age: i64,
    pub max_age: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub days: Option<u32>,
}

/// Body of `GET /count`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCountResponse {
    pub total_users: u64,
    pub message: String,
}

/// Body of `GET /count/name/{name}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NameCountResponse {
    pub name: String,
    pub count: u64,
}

/// Body of `GET /exists/email/{email}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailExistsResponse {
    pub email: String,
    pub exists: bool,
    pub message: String,
}

/// Body of `GET /{id}/summary`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub user: User,
}

/// Body of a successful `DELETE /{id}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub deleted_user_id: UserId,
}

#[get("")]
pub async fn list_users(state: web::Data<AppState>) -> Users {
    let users = state
        .call(Action::Read, |service| service.get_all_users())
        .await?;
    Ok(web::Json(users))
}

#[get("/{id:\\d+}")]
pub async fn get_user(state: web::Data<AppState>, path: web::Path<UserId>) -> ApiResult<web::Json<User>> {
    let id = path.into_inner();
    state
        .call(Action::Read, move |service| service.get_user_by_id(id))
        .await?
        .map(web::Json)
        .ok_or_else(ApiError::not_found)
}

#[get("/email/{email}")]
pub async fn get_user_by_email(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let email = path.into_inner();
    state
        .call(Action::Read, move |service| service.get_user_by_email(&email))
        .await?
        .map(web::Json)
        .ok_or_else(ApiError::not_found)
}

#[post("")]
pub async fn create_user(
    state: web::Data<AppState>,
    payload: web::Json<UserDraft>,
) -> ApiResult<HttpResponse> {
    let draft = payload.into_inner();
    let created = state
        .call(Action::Create, move |service| service.create_user(draft))
        .await?;
    Ok(HttpResponse::Created().json(created))
}

#[put("/{id:\\d+}")]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
    payload: web::Json<UserDraft>,
) -> ApiResult<web::Json<User>> {
    let id = path.into_inner();
    let draft = payload.into_inner();
    let updated = state
        .call(Action::Update, move |service| service.update_user(id, draft))
        .await?;
    Ok(web::Json(updated))
}

#[delete("/{id:\\d+}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
) -> ApiResult<web::Json<DeleteResponse>> {
    let id = path.into_inner();
    state
        .call(Action::Delete, move |service| service.delete_user(id))
        .await?;
    Ok(web::Json(DeleteResponse {
        message: "User deleted successfully.".to_owned(),
        deleted_user_id: id,
    }))
}

/// Case-sensitive substring match.
#[get("/search")]
pub async fn search_by_name(state: web::Data<AppState>, query: web::Query<NameQuery>) -> Users {
    let NameQuery { name } = query.into_inner();
    let users = state
        .call(Action::Read, move |service| service.search_users_by_name(&name))
        .await?;
    Ok(web::Json(users))
}

#[get("/search/ignore-case")]
pub async fn search_by_name_ignore_case(
    state: web::Data<AppState>,
    query: web::Query<NameQuery>,
) -> Users {
    let NameQuery { name } = query.into_inner();
    let users = state
        .call(Action::Read, move |service| {
            service.search_users_by_name_ignore_case(&name)
        })
        .await?;
    Ok(web::Json(users))
}

#[get("/search/age")]
pub async fn search_by_age_range(
    state: web::Data<AppState>,
    query: web::Query<AgeRangeQuery>,
) -> Users {
    let AgeRangeQuery { min_age, max_age } = query.into_inner();
    let users = state
        .call(Action::Read, move |service| {
            service.search_users_by_age_range(min_age, max_age)
        })
        .await?;
    Ok(web::Json(users))
}

#[get("/adults")]
pub async fn adults(state: web::Data<AppState>) -> Users {
    let users = state
        .call(Action::Read, |service| service.get_adult_users())
        .await?;
    Ok(web::Json(users))
}

#[get("/age/{age}")]
pub async fn by_min_age(state: web::Data<AppState>, path: web::Path<i64>) -> Users {
    let age = path.into_inner();
    let users = state
        .call(Action::Read, move |service| service.get_users_by_min_age(age))
        .await?;
    Ok(web::Json(users))
}

#[get("/domain/{domain}")]
pub async fn by_email_domain(state: web::Data<AppState>, path: web::Path<String>) -> Users {
    let domain = path.into_inner();
    let users = state
        .call(Action::Read, move |service| {
            service.get_users_by_email_domain(&domain)
        })
        .await?;
    Ok(web::Json(users))
}

#[get("/with-phone")]
pub async fn with_phone_number(state: web::Data<AppState>) -> Users {
    let users = state
        .call(Action::Read, |service| service.get_users_with_phone_number())
        .await?;
    Ok(web::Json(users))
}

#[get("/sorted/age")]
pub async fn sorted_by_age(state: web::Data<AppState>) -> Users {
    let users = state
        .call(Action::Read, |service| service.get_users_sorted_by_age())
        .await?;
    Ok(web::Json(users))
}

#[get("/sorted/name")]
pub async fn sorted_by_name_desc(state: web::Data<AppState>) -> Users {
    let users = state
        .call(Action::Read, |service| service.get_users_sorted_by_name_desc())
        .await?;
    Ok(web::Json(users))
}

/// Counts per age bracket; empty brackets are omitted.
#[get("/statistics")]
pub async fn age_statistics(state: web::Data<AppState>) -> ApiResult<web::Json<AgeStatistics>> {
    let stats = state
        .call(Action::Read, |service| service.get_age_statistics())
        .await?;
    Ok(web::Json(stats))
}

#[get("/statistics/domains")]
pub async fn domain_statistics(
    state: web::Data<AppState>,
) -> ApiResult<web::Json<DomainStatistics>> {
    let stats = state
        .call(Action::Read, |service| service.get_domain_statistics())
        .await?;
    Ok(web::Json(stats))
}

#[get("/recent")]
pub async fn recent_users(state: web::Data<AppState>, query: web::Query<RecentQuery>) -> Users {
    let days = query.days.unwrap_or(DEFAULT_RECENT_DAYS);
    let users = state
        .call(Action::Read, move |service| service.get_recent_users(days))
        .await?;
    Ok(web::Json(users))
}

#[get("/count")]
pub async fn total_count(state: web::Data<AppState>) -> ApiResult<web::Json<TotalCountResponse>> {
    let total_users = state
        .call(Action::Read, |service| service.get_total_user_count())
        .await?;
    Ok(web::Json(TotalCountResponse {
        total_users,
        message: "Total user count retrieved.".to_owned(),
    }))
}

#[get("/count/name/{name}")]
pub async fn count_by_name(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<NameCountResponse>> {
    let name = path.into_inner();
    let lookup = name.clone();
    let count = state
        .call(Action::Read, move |service| {
            service.get_user_count_by_name(&lookup)
        })
        .await?;
    Ok(web::Json(NameCountResponse { name, count }))
}

#[get("/exists/email/{email}")]
pub async fn email_exists(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<EmailExistsResponse>> {
    let email = path.into_inner();
    let lookup = email.clone();
    let exists = state
        .call(Action::Read, move |service| service.is_email_exists(&lookup))
        .await?;
    let message = if exists {
        "Email exists."
    } else {
        "Email does not exist."
    };
    Ok(web::Json(EmailExistsResponse {
        email,
        exists,
        message: message.to_owned(),
    }))
}

#[get("/{id:\\d+}/summary")]
pub async fn user_summary(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
) -> ApiResult<web::Json<SummaryResponse>> {
    let id = path.into_inner();
    let (user, summary) = state
        .call(Action::Read, move |service| {
            Ok(service.get_user_by_id(id)?.map(|user| {
                let summary = service.user_summary(&user);
                (user, summary)
            }))
        })
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(web::Json(SummaryResponse { user, summary }))
}
