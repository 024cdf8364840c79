//! Sample data bootstrap for empty databases.
//!
//! # Responsibility
//! - Insert a fixed demo population on first start.
//! - Report per-record failures without aborting the batch.
//!
//! # Invariants
//! - Seeding never touches a non-empty table.
//! - Every sample goes through `UserService::create_user`, so the same
//!   validation and uniqueness rules apply as for API callers.

use crate::model::user::UserDraft;
use crate::repo::user_repo::UserRepository;
use crate::service::user_service::{ServiceResult, UserService};
use log::{info, warn};

struct SampleUser {
    name: &'static str,
    email: &'static str,
    age: i64,
    phone_number: Option<&'static str>,
    address: Option<&'static str>,
}

const fn sample(
    name: &'static str,
    email: &'static str,
    age: i64,
    phone_number: Option<&'static str>,
    address: Option<&'static str>,
) -> SampleUser {
    SampleUser {
        name,
        email,
        age,
        phone_number,
        address,
    }
}

// Spread over every age bracket and several domains; a few rows omit the
// optional fields so the phone/domain projections have something to filter.
const SAMPLE_USERS: &[SampleUser] = &[
    sample("Minji Kang", "minji@example.com", 17, Some("010-1000-0001"), Some("Seoul Gangnam-gu")),
    sample("Jiwoo Han", "jiwoo@example.com", 24, Some("010-1000-0002"), Some("Seoul Seocho-gu")),
    sample("Seojun Park", "seojun@gmail.com", 22, Some("010-1000-0003"), Some("Busan Haeundae-gu")),
    sample("Hayoon Choi", "hayoon@naver.com", 27, Some("010-1000-0004"), Some("Daegu Suseong-gu")),
    sample("Doyun Jung", "doyun@example.com", 29, None, Some("Incheon Yeonsu-gu")),
    sample("Seoyeon Lim", "seoyeon@gmail.com", 31, Some("010-1000-0006"), Some("Gwangju Seo-gu")),
    sample("Eunwoo Yoon", "eunwoo@example.com", 34, Some("010-1000-0007"), None),
    sample("Jiho Song", "jiho@naver.com", 36, None, Some("Daejeon Yuseong-gu")),
    sample("Sua Jang", "sua@example.com", 38, Some("010-1000-0009"), Some("Ulsan Nam-gu")),
    sample("Yejun Oh", "yejun@hotmail.com", 41, Some("010-1000-0010"), Some("Sejong")),
    sample("Chaewon Seo", "chaewon@example.com", 44, Some("010-1000-0011"), Some("Suwon")),
    sample("Siwoo Kwon", "siwoo@gmail.com", 47, None, None),
    sample("Jia Hwang", "jia@example.com", 52, Some("010-1000-0013"), Some("Seongnam")),
    sample("Juwon Ahn", "juwon@naver.com", 56, Some("010-1000-0014"), Some("Anyang")),
    sample("Yuna Shin", "yuna@example.com", 58, Some("010-1000-0015"), None),
    sample("Hyunwoo Jo", "hyunwoo@example.com", 63, Some("010-1000-0016"), Some("Goyang")),
    sample("Soyeon Bae", "soyeon@gmail.com", 67, None, Some("Yongin")),
    sample("Taeyang Noh", "taeyang@example.com", 72, Some("010-1000-0018"), Some("Jeonju")),
    sample("Dana Moon", "dana@company.co.kr", 26, Some("010-1000-0019"), Some("Seoul Jongno-gu")),
    sample("Ian Yoo", "ian@university.ac.kr", 23, Some("010-1000-0020"), Some("Seoul Jung-gu")),
    sample("Rina Baek", "rina@startup.io", 28, Some("010-1000-0021"), Some("Seoul Yongsan-gu")),
    sample("Leo Heo", "leo@startup.io", 33, Some("010-1000-0022"), Some("Seoul Songpa-gu")),
];

/// One sample that could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFailure {
    pub email: String,
    pub error_code: &'static str,
    pub message: String,
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Rows already present; non-zero means seeding was skipped.
    pub existing: u64,
    pub created: usize,
    pub failures: Vec<SeedFailure>,
}

impl SeedReport {
    pub fn skipped(&self) -> bool {
        self.existing > 0
    }
}

/// Number of users `seed_sample_users` tries to insert.
pub fn sample_user_count() -> usize {
    SAMPLE_USERS.len()
}

/// Inserts the demo population when the user table is empty.
///
/// # Errors
/// - Returns an error only when the initial count fails; individual insert
///   failures are collected in `SeedReport::failures`.
pub fn seed_sample_users<R: UserRepository>(service: &UserService<R>) -> ServiceResult<SeedReport> {
    let existing = service.get_total_user_count()?;
    if existing > 0 {
        info!(
            "event=sample_data_seed module=seed status=skipped existing_users={}",
            existing
        );
        return Ok(SeedReport {
            existing,
            ..SeedReport::default()
        });
    }

    info!(
        "event=sample_data_seed module=seed status=start samples={}",
        SAMPLE_USERS.len()
    );
    let mut report = SeedReport::default();
    for sample in SAMPLE_USERS {
        let mut draft = UserDraft::new(sample.name, sample.email, sample.age);
        draft.phone_number = sample.phone_number.map(str::to_owned);
        draft.address = sample.address.map(str::to_owned);

        match service.create_user(draft) {
            Ok(_) => report.created += 1,
            Err(err) => {
                warn!(
                    "event=sample_data_seed module=seed status=error error_code={}",
                    err.code()
                );
                report.failures.push(SeedFailure {
                    email: sample.email.to_owned(),
                    error_code: err.code(),
                    message: err.to_string(),
                });
            }
        }
    }

    info!(
        "event=sample_data_seed module=seed status=ok created={} failed={}",
        report.created,
        report.failures.len()
    );
    log_statistics(service);
    Ok(report)
}

fn log_statistics<R: UserRepository>(service: &UserService<R>) {
    match service.get_age_statistics() {
        Ok(stats) => {
            for (bracket, count) in stats.iter() {
                info!(
                    "event=sample_data_stats module=seed kind=age_bracket bracket={} count={}",
                    bracket.label(),
                    count
                );
            }
        }
        Err(err) => warn!(
            "event=sample_data_stats module=seed status=error kind=age_bracket error_code={}",
            err.code()
        ),
    }

    match service.get_domain_statistics() {
        Ok(stats) => {
            for (domain, count) in stats.iter() {
                info!(
                    "event=sample_data_stats module=seed kind=email_domain domain={} count={}",
                    domain, count
                );
            }
        }
        Err(err) => warn!(
            "event=sample_data_stats module=seed status=error kind=email_domain error_code={}",
            err.code()
        ),
    }
}
