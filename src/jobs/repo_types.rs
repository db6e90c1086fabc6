use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

pub const DEFAULT_STATUS: &str = "Open";

/// Job post fields supplied by the owning company.
#[derive(Debug, Clone)]
pub struct NewJobPost {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub status: String,
    pub salary: String,
    pub address: String,
}

/// A job post joined with its owner's company name and email.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct JobPost {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub status: String,
    pub salary: String,
    pub address: String,
    pub company_name: String,
    pub company_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Filters for the job listing; every field is bound, never interpolated.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    pub created_after: Option<OffsetDateTime>,
    /// Hide posts this user already applied to.
    pub exclude_applied_by: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Application {
    pub user_id: i32,
    pub job_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Escapes LIKE metacharacters so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
