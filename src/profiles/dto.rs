use serde::{Deserialize, Serialize};

use crate::{
    auth::repo_types::Role,
    error::AppError,
    profiles::repo_types::{
        CompanyDetails, EducationEntry, ExperienceEntry, NewStudentProfile, StudentDetails,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistrationRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub jobs: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
}

impl From<StudentRegistrationRequest> for NewStudentProfile {
    fn from(r: StudentRegistrationRequest) -> Self {
        Self {
            description: r.description,
            image_path: r.image_path,
            jobs: r.jobs,
            education: r.education,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    #[serde(rename = "userID")]
    pub user_id: Option<i32>,
}

impl UserIdQuery {
    pub fn require(&self) -> Result<i32, AppError> {
        self.user_id
            .ok_or_else(|| AppError::validation("User ID is required"))
    }
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Option<Role>,
}

/// Either profile shape, serialized without a wrapper; `role` tells them apart.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserDetails {
    Student(StudentDetails),
    Company(CompanyDetails),
}
