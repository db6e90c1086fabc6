use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
            MessageResponse, RefreshRequest, RegisterRequest, RegisterResponse, TokenPair,
            VerifyEmailQuery,
        },
        jwt::JwtKeys,
        services,
    },
    error::{ApiJson, ApiQuery, AppError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/verify_email", get(verify_email))
        .route("/forgot_password", post(forgot_password))
        .route("/change_password", post(change_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let res = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, keys, payload))]
pub async fn login(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(services::login(&state, &keys, payload).await?))
}

#[instrument(skip(state, keys, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>, AppError> {
    Ok(Json(services::refresh(&state, &keys, &payload.refresh_token).await?))
}

#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VerifyEmailQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    services::verify_email(&state, query.token.as_deref()).await?;
    Ok(Json(MessageResponse::new("Email verified successfully.")))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::forgot_password(&state, &payload.email, OffsetDateTime::now_utc()).await?;
    Ok(Json(MessageResponse::new(
        "Password reset email sent successfully. Please check your email.",
    )))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::change_password(&state, payload, OffsetDateTime::now_utc()).await?;
    Ok(Json(MessageResponse::new("Password reset successfully.")))
}
