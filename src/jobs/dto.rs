use serde::Deserialize;

use crate::{error::AppError, jobs::repo_types::{NewJobPost, DEFAULT_STATUS}};

#[derive(Debug, Deserialize)]
pub struct PostJobRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub address: String,
}

impl PostJobRequest {
    /// Trims every field and rejects blanks; a blank status falls back to the default.
    pub fn validate(self) -> Result<NewJobPost, AppError> {
        fn required(name: &str, value: String) -> Result<String, AppError> {
            let value = value.trim().to_string();
            if value.is_empty() {
                return Err(AppError::validation(format!("{name} is required")));
            }
            Ok(value)
        }

        let status = self
            .status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS.to_string());

        Ok(NewJobPost {
            title: required("title", self.title)?,
            description: required("description", self.description)?,
            requirements: required("requirements", self.requirements)?,
            status,
            salary: required("salary", self.salary)?,
            address: required("address", self.address)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    pub title: Option<String>,
    /// Only posts from the last two weeks.
    #[serde(default)]
    pub latest: bool,
    /// Hide posts this user already applied to.
    pub user_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct JobIdQuery {
    #[serde(rename = "jobID")]
    pub job_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub job_id: i32,
    #[serde(default)]
    pub cv_download_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> PostJobRequest {
        PostJobRequest {
            title: " Backend dev ".into(),
            description: "Rust".into(),
            requirements: "2y".into(),
            status: None,
            salary: "100".into(),
            address: "Remote".into(),
        }
    }

    #[test]
    fn status_defaults_to_open() {
        let post = full().validate().unwrap();
        assert_eq!(post.status, "Open");
        assert_eq!(post.title, "Backend dev");
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let mut req = full();
        req.salary = "  ".into();
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "salary is required");
    }
}
