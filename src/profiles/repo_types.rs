use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::repo_types::Role;

pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Work history entry as submitted by a student.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Education entry as submitted by a student.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub school: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field_of_study: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything written when a user becomes a student.
#[derive(Debug, Clone, Default)]
pub struct NewStudentProfile {
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub jobs: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
}

/// Company profile fields; also used for updates.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub video_path: Option<String>,
}

/// Outcome of the guarded one-time role selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSelection {
    Selected,
    AlreadySelected,
    UnknownUser,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: i32,
    pub school: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

/// `students` row joined with the owning user.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct StudentRow {
    pub id: i32,
    pub email: String,
    pub fname: String,
    pub description: Option<String>,
    pub profile_image: Option<String>,
    pub is_cv_created: bool,
    pub cv_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDetails {
    pub id: i32,
    pub email: String,
    pub fname: String,
    pub role: Role,
    pub description: Option<String>,
    #[serde(rename = "profileImage")]
    pub profile_image: Option<String>,
    pub is_cv_created: bool,
    pub cv_path: Option<String>,
    pub jobs: Vec<Experience>,
    pub education: Vec<Education>,
}

impl StudentDetails {
    pub(crate) fn from_parts(row: StudentRow, jobs: Vec<Experience>, education: Vec<Education>) -> Self {
        Self {
            id: row.id,
            email: row.email,
            fname: row.fname,
            role: Role::Student,
            description: row.description,
            profile_image: row.profile_image,
            is_cv_created: row.is_cv_created,
            cv_path: row.cv_path,
            jobs,
            education,
        }
    }
}

/// `companies` row joined with the owning user.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct CompanyRow {
    pub user_id: i32,
    pub email: String,
    pub fname: String,
    pub name: String,
    pub size: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub video_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetails {
    pub user_id: i32,
    pub email: String,
    pub fname: String,
    pub role: Role,
    pub name: String,
    pub size: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub video_path: Option<String>,
}

impl From<CompanyRow> for CompanyDetails {
    fn from(r: CompanyRow) -> Self {
        Self {
            user_id: r.user_id,
            email: r.email,
            fname: r.fname,
            role: Role::Company,
            name: r.name,
            size: r.size,
            address: r.address,
            description: r.description,
            image_path: r.image_path,
            video_path: r.video_path,
        }
    }
}
