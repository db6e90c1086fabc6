use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};

use crate::{
    auth::{repo_types::Role, services::current_user},
    error::AppError,
    jobs::{
        dto::{ApplyRequest, JobsQuery},
        repo::JobRepo,
        repo_types::{Application, JobFilter, JobPost, NewJobPost},
    },
    state::AppState,
};

/// Window for `latest=true` listings.
pub const LATEST_WINDOW: Duration = Duration::weeks(2);

#[instrument(skip(state, post), fields(title = %post.title))]
pub async fn post_job(
    state: &AppState,
    owner_id: i32,
    post: NewJobPost,
) -> Result<JobPost, AppError> {
    let owner = current_user(state, owner_id).await?;
    if owner.role != Some(Role::Company) {
        return Err(AppError::Forbidden("Only companies can post jobs".into()));
    }
    let job = state.db(state.store.insert_job_post(owner_id, &post)).await?;
    info!(job_id = job.id, "job post created");
    Ok(job)
}

pub fn filter_from_query(query: JobsQuery, now: OffsetDateTime) -> JobFilter {
    JobFilter {
        title: query
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        created_after: query.latest.then(|| now - LATEST_WINDOW),
        exclude_applied_by: query.user_id,
    }
}

#[instrument(skip(state))]
pub async fn list_jobs(state: &AppState, filter: JobFilter) -> Result<Vec<JobPost>, AppError> {
    Ok(state.db(state.store.list_job_posts(&filter)).await?)
}

pub async fn find_job(state: &AppState, job_id: i32) -> Result<JobPost, AppError> {
    state
        .db(state.store.find_job_post(job_id))
        .await?
        .ok_or_else(|| AppError::not_found("Job post not found"))
}

fn application_body(student_id: i32, job: &JobPost, cv_link: Option<&str>) -> String {
    let mut body = format!(
        "A student with ID {student_id} has applied for your job \"{}\".",
        job.title
    );
    if let Some(link) = cv_link.filter(|l| !l.trim().is_empty()) {
        body.push_str(&format!(" You can download their CV here: {link}"));
    }
    body
}

/// Records the application, then makes one attempt to tell the job owner.
/// The notification outcome never affects the result.
#[instrument(skip(state, req), fields(job_id = req.job_id))]
pub async fn apply(
    state: &AppState,
    student_id: i32,
    req: ApplyRequest,
) -> Result<Application, AppError> {
    let student = current_user(state, student_id).await?;
    if student.role != Some(Role::Student) {
        return Err(AppError::Forbidden("Only students can apply for jobs".into()));
    }
    let job = find_job(state, req.job_id).await?;

    let application = state
        .db(state.store.insert_application(student_id, job.id))
        .await?;
    info!("application recorded");

    let body = application_body(student_id, &job, req.cv_download_link.as_deref());
    let _ = state
        .notifier
        .send_plain(&job.company_email, "New Job Application", &body)
        .await;

    Ok(application)
}
