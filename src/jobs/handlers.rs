use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::{dto::MessageResponse, jwt::AuthUser},
    error::{ApiJson, ApiQuery, AppError},
    jobs::{
        dto::{ApplyRequest, JobIdQuery, JobsQuery, PostJobRequest},
        repo_types::JobPost,
        services,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/job", get(get_job))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/post_job", post(post_job))
        .route("/apply_for_job", post(apply_for_job))
}

#[instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<JobsQuery>,
) -> Result<Json<Vec<JobPost>>, AppError> {
    let filter = services::filter_from_query(q, OffsetDateTime::now_utc());
    Ok(Json(services::list_jobs(&state, filter).await?))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<JobIdQuery>,
) -> Result<Json<JobPost>, AppError> {
    let job_id = q
        .job_id
        .ok_or_else(|| AppError::validation("Invalid job ID"))?;
    Ok(Json(services::find_job(&state, job_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn post_job(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<PostJobRequest>,
) -> Result<(StatusCode, Json<JobPost>), AppError> {
    let post = payload.validate()?;
    let job = services::post_job(&state, user_id, post).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[instrument(skip(state, payload))]
pub async fn apply_for_job(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<ApplyRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::apply(&state, user_id, payload).await?;
    Ok(Json(MessageResponse::new("Application submitted successfully")))
}
