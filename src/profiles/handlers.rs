use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{dto::MessageResponse, jwt::AuthUser},
    error::{ApiJson, ApiQuery, AppError},
    profiles::{
        dto::{RoleResponse, StudentRegistrationRequest, UserDetails, UserIdQuery},
        repo_types::{CompanyDetails, CompanyProfile, EducationEntry, ExperienceEntry, StudentDetails},
        services,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/user_details", get(user_details))
        .route("/user_role", get(user_role))
        .route("/student", get(student))
        .route("/company", get(company).put(update_company))
        .route("/students", get(list_students))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/student_registration", post(register_student))
        .route("/company_registration", post(register_company))
        .route("/student/jobs/:id", put(update_experience))
        .route("/student/education/:id", put(update_education))
}

#[instrument(skip(state, payload))]
pub async fn register_student(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<StudentRegistrationRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::register_student(&state, user_id, payload.into()).await?;
    Ok(Json(MessageResponse::new("Registration successful")))
}

#[instrument(skip(state, payload))]
pub async fn register_company(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CompanyProfile>,
) -> Result<Json<MessageResponse>, AppError> {
    services::register_company(&state, user_id, payload).await?;
    Ok(Json(MessageResponse::new("Registration successful")))
}

#[instrument(skip(state))]
pub async fn user_details(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<UserIdQuery>,
) -> Result<Json<UserDetails>, AppError> {
    Ok(Json(services::user_details(&state, q.require()?).await?))
}

#[instrument(skip(state))]
pub async fn user_role(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<UserIdQuery>,
) -> Result<Json<RoleResponse>, AppError> {
    let role = services::user_role(&state, q.require()?).await?;
    Ok(Json(RoleResponse { role }))
}

#[instrument(skip(state))]
pub async fn student(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<UserIdQuery>,
) -> Result<Json<StudentDetails>, AppError> {
    Ok(Json(services::student(&state, q.require()?).await?))
}

#[instrument(skip(state))]
pub async fn company(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<UserIdQuery>,
) -> Result<Json<CompanyDetails>, AppError> {
    Ok(Json(services::company(&state, q.require()?).await?))
}

#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentDetails>>, AppError> {
    Ok(Json(services::list_students(&state).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_experience(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(entry_id): Path<i32>,
    ApiJson(payload): ApiJson<ExperienceEntry>,
) -> Result<Json<MessageResponse>, AppError> {
    services::update_experience(&state, user_id, entry_id, payload).await?;
    Ok(Json(MessageResponse::new("Student job updated successfully")))
}

#[instrument(skip(state, payload))]
pub async fn update_education(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(entry_id): Path<i32>,
    ApiJson(payload): ApiJson<EducationEntry>,
) -> Result<Json<MessageResponse>, AppError> {
    services::update_education(&state, user_id, entry_id, payload).await?;
    Ok(Json(MessageResponse::new("Education updated successfully")))
}

#[instrument(skip(state, payload))]
pub async fn update_company(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CompanyProfile>,
) -> Result<Json<MessageResponse>, AppError> {
    services::update_company(&state, user_id, payload).await?;
    Ok(Json(MessageResponse::new("Company updated successfully")))
}
