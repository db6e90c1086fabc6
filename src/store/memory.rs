//! In-memory store for tests. Multi-row writes stage a copy of the tables and
//! swap it in only when every step succeeded, mirroring a rolled-back
//! transaction on failure.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, Role, User},
    },
    jobs::{
        repo::JobRepo,
        repo_types::{Application, JobFilter, JobPost, NewJobPost},
    },
    profiles::{
        repo::ProfileRepo,
        repo_types::{
            CompanyDetails, CompanyProfile, CompanyRow, Education, EducationEntry, Experience,
            ExperienceEntry, NewStudentProfile, RoleSelection, StudentDetails, StudentRow,
        },
    },
    store::StoreError,
};

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub user_id: i32,
    pub description: Option<String>,
    pub profile_image: Option<String>,
    pub is_cv_created: bool,
    pub cv_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HistoryRecord<T> {
    pub id: i32,
    pub user_id: i32,
    pub entry: T,
}

#[derive(Debug, Clone)]
pub struct JobPostRecord {
    pub id: i32,
    pub user_id: i32,
    pub post: NewJobPost,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub students: Vec<StudentRecord>,
    pub companies: Vec<(i32, CompanyProfile)>,
    pub jobs: Vec<HistoryRecord<ExperienceEntry>>,
    pub education: Vec<HistoryRecord<EducationEntry>>,
    pub job_posts: Vec<JobPostRecord>,
    pub applications: Vec<Application>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn user_by_id_mut(&mut self, id: i32) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn job_post(&self, rec: &JobPostRecord) -> Option<JobPost> {
        let owner = self.users.iter().find(|u| u.id == rec.user_id)?;
        let company_name = self
            .companies
            .iter()
            .find(|(uid, _)| *uid == rec.user_id)
            .map(|(_, c)| c.name.clone())
            .unwrap_or_default();
        Some(JobPost {
            id: rec.id,
            user_id: rec.user_id,
            title: rec.post.title.clone(),
            description: rec.post.description.clone(),
            requirements: rec.post.requirements.clone(),
            status: rec.post.status.clone(),
            salary: rec.post.salary.clone(),
            address: rec.post.address.clone(),
            company_name,
            company_email: owner.email.clone(),
            created_at: rec.created_at,
        })
    }

    fn student(&self, user: &User) -> Option<StudentDetails> {
        let s = self.students.iter().find(|s| s.user_id == user.id)?;
        let row = StudentRow {
            id: user.id,
            email: user.email.clone(),
            fname: user.fname.clone(),
            description: s.description.clone(),
            profile_image: s.profile_image.clone(),
            is_cv_created: s.is_cv_created,
            cv_path: s.cv_path.clone(),
        };
        let jobs = self
            .jobs
            .iter()
            .filter(|j| j.user_id == user.id)
            .map(|j| Experience {
                id: j.id,
                title: j.entry.title.clone(),
                company: j.entry.company.clone(),
                start_date: j.entry.start_date.clone(),
                end_date: j.entry.end_date.clone(),
                description: j.entry.description.clone(),
            })
            .collect();
        let education = self
            .education
            .iter()
            .filter(|e| e.user_id == user.id)
            .map(|e| Education {
                id: e.id,
                school: e.entry.school.clone(),
                degree: e.entry.degree.clone(),
                field_of_study: e.entry.field_of_study.clone(),
                start_date: e.entry.start_date.clone(),
                end_date: e.entry.end_date.clone(),
                description: e.entry.description.clone(),
            })
            .collect();
        Some(StudentDetails::from_parts(row, jobs, education))
    }

    fn select_role(&mut self, user_id: i32) -> RoleSelection {
        match self.users.iter().find(|u| u.id == user_id) {
            None => RoleSelection::UnknownUser,
            Some(u) if u.has_selected_role => RoleSelection::AlreadySelected,
            Some(_) => RoleSelection::Selected,
        }
    }

    fn set_role(&mut self, user_id: i32, role: Role) {
        if let Some(u) = self.user_by_id_mut(user_id) {
            u.has_selected_role = true;
            u.role = Some(role);
            u.updated_at = OffsetDateTime::now_utc();
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// 1-based index of the experience row whose insert should fail.
    fail_experience_insert_at: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn snapshot(&self) -> Tables {
        self.tables.lock().unwrap().clone()
    }

    pub fn user(&self, email: &str) -> Option<User> {
        self.snapshot().users.into_iter().find(|u| u.email == email)
    }

    pub fn fail_experience_insert_at(&self, n: usize) {
        *self.fail_experience_insert_at.lock().unwrap() = Some(n);
    }

    /// Test hook for editing rows directly, e.g. to age a token.
    pub fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        f(&mut self.tables.lock().unwrap())
    }

    fn injected_failure() -> StoreError {
        StoreError::Database(sqlx::Error::Protocol("injected insert failure".into()))
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.user(email))
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.snapshot().users.into_iter().find(|u| u.id == id))
    }

    async fn insert_user(&self, new: &NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("users.email"));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: t.next_id(),
            email: new.email.clone(),
            fname: new.fname.clone(),
            password_hash: new.password_hash.clone(),
            is_verified: false,
            verification_token: Some(new.verification_token.clone()),
            reset_token: None,
            reset_token_expires: None,
            has_selected_role: false,
            role: None,
            instagram_url: None,
            facebook_url: None,
            twitter_url: None,
            linkedin_url: None,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn consume_verification_token(&self, token: &str) -> Result<Option<i32>, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let Some(u) = t
            .users
            .iter_mut()
            .find(|u| u.verification_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };
        u.is_verified = true;
        u.verification_token = None;
        Ok(Some(u.id))
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let Some(u) = t.users.iter_mut().find(|u| u.email == email) else {
            return Ok(false);
        };
        u.reset_token = Some(token.to_string());
        u.reset_token_expires = Some(expires_at);
        Ok(true)
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<String>, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let Some(u) = t.users.iter_mut().find(|u| {
            u.reset_token.as_deref() == Some(token)
                && u.reset_token_expires.is_some_and(|exp| exp > now)
        }) else {
            return Ok(None);
        };
        u.password_hash = password_hash.to_string();
        u.reset_token = None;
        u.reset_token_expires = None;
        Ok(Some(u.email.clone()))
    }
}

#[async_trait]
impl ProfileRepo for MemoryStore {
    async fn register_student(
        &self,
        user_id: i32,
        profile: &NewStudentProfile,
    ) -> Result<RoleSelection, StoreError> {
        let fail_at = *self.fail_experience_insert_at.lock().unwrap();
        let mut t = self.tables.lock().unwrap();
        let selection = t.select_role(user_id);
        if selection != RoleSelection::Selected {
            return Ok(selection);
        }

        let mut staged = t.clone();
        staged.students.push(StudentRecord {
            user_id,
            description: profile.description.clone(),
            profile_image: profile.image_path.clone(),
            is_cv_created: false,
            cv_path: None,
        });
        for (i, job) in profile.jobs.iter().enumerate() {
            if fail_at == Some(i + 1) {
                return Err(Self::injected_failure());
            }
            let id = staged.next_id();
            staged.jobs.push(HistoryRecord { id, user_id, entry: job.clone() });
        }
        for edu in &profile.education {
            let id = staged.next_id();
            staged.education.push(HistoryRecord { id, user_id, entry: edu.clone() });
        }
        staged.set_role(user_id, Role::Student);

        *t = staged;
        Ok(RoleSelection::Selected)
    }

    async fn register_company(
        &self,
        user_id: i32,
        profile: &CompanyProfile,
    ) -> Result<RoleSelection, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let selection = t.select_role(user_id);
        if selection != RoleSelection::Selected {
            return Ok(selection);
        }
        t.companies.push((user_id, profile.clone()));
        t.set_role(user_id, Role::Company);
        Ok(RoleSelection::Selected)
    }

    async fn student_details(&self, user_id: i32) -> Result<Option<StudentDetails>, StoreError> {
        let t = self.snapshot();
        Ok(t.users
            .iter()
            .find(|u| u.id == user_id)
            .and_then(|u| t.student(u)))
    }

    async fn company_details(&self, user_id: i32) -> Result<Option<CompanyDetails>, StoreError> {
        let t = self.snapshot();
        let Some(user) = t.users.iter().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        Ok(t.companies
            .iter()
            .find(|(uid, _)| *uid == user_id)
            .map(|(_, c)| {
                CompanyDetails::from(CompanyRow {
                    user_id,
                    email: user.email.clone(),
                    fname: user.fname.clone(),
                    name: c.name.clone(),
                    size: c.size.clone(),
                    address: c.address.clone(),
                    description: c.description.clone(),
                    image_path: c.image_path.clone(),
                    video_path: c.video_path.clone(),
                })
            }))
    }

    async fn list_students(&self) -> Result<Vec<StudentDetails>, StoreError> {
        let t = self.snapshot();
        Ok(t.users
            .iter()
            .filter(|u| u.role == Some(Role::Student))
            .filter_map(|u| t.student(u))
            .collect())
    }

    async fn update_experience(
        &self,
        user_id: i32,
        entry_id: i32,
        entry: &ExperienceEntry,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        match t.jobs.iter_mut().find(|j| j.id == entry_id && j.user_id == user_id) {
            Some(j) => {
                j.entry = entry.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_education(
        &self,
        user_id: i32,
        entry_id: i32,
        entry: &EducationEntry,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        match t.education.iter_mut().find(|e| e.id == entry_id && e.user_id == user_id) {
            Some(e) => {
                e.entry = entry.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_company(
        &self,
        user_id: i32,
        profile: &CompanyProfile,
    ) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().unwrap();
        match t.companies.iter_mut().find(|(uid, _)| *uid == user_id) {
            Some((_, c)) => {
                *c = profile.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl JobRepo for MemoryStore {
    async fn insert_job_post(
        &self,
        owner_id: i32,
        post: &NewJobPost,
    ) -> Result<JobPost, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let rec = JobPostRecord {
            id: t.next_id(),
            user_id: owner_id,
            post: post.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.job_posts.push(rec.clone());
        t.job_post(&rec)
            .ok_or_else(|| StoreError::Decode(format!("job post owner {owner_id} missing")))
    }

    async fn list_job_posts(&self, filter: &JobFilter) -> Result<Vec<JobPost>, StoreError> {
        let t = self.snapshot();
        let needle = filter.title.as_ref().map(|s| s.to_lowercase());
        let mut out: Vec<JobPost> = t
            .job_posts
            .iter()
            .filter(|p| {
                needle
                    .as_ref()
                    .map_or(true, |n| p.post.title.to_lowercase().contains(n.as_str()))
            })
            .filter(|p| filter.created_after.map_or(true, |after| p.created_at >= after))
            .filter(|p| {
                filter.exclude_applied_by.map_or(true, |uid| {
                    !t.applications
                        .iter()
                        .any(|a| a.user_id == uid && a.job_id == p.id)
                })
            })
            .filter_map(|p| t.job_post(p))
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn find_job_post(&self, id: i32) -> Result<Option<JobPost>, StoreError> {
        let t = self.snapshot();
        Ok(t.job_posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| t.job_post(p)))
    }

    async fn insert_application(
        &self,
        student_id: i32,
        job_id: i32,
    ) -> Result<Application, StoreError> {
        let mut t = self.tables.lock().unwrap();
        let app = Application {
            user_id: student_id,
            job_id,
            created_at: OffsetDateTime::now_utc(),
        };
        t.applications.push(app.clone());
        Ok(app)
    }
}
