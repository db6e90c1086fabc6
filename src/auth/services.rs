use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
            TokenPair,
        },
        jwt::JwtKeys,
        password::{generate_token, hash_password, verify_password},
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    error::AppError,
    state::AppState,
    store::StoreError,
};

pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Burns one argon2 verification so an unknown email costs what a wrong password does.
fn verify_against_dummy(plain: &str) {
    lazy_static! {
        static ref DUMMY_HASH: Option<String> = hash_password("dummy-password").ok();
    }
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Loads the caller named by an access token; a vanished user is a stale session.
pub async fn current_user(state: &AppState, user_id: i32) -> Result<User, AppError> {
    state
        .db(state.store.find_user_by_id(user_id))
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(state: &AppState, req: RegisterRequest) -> Result<RegisterResponse, AppError> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        warn!("invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    if req.password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }
    let fname = req.fname.trim();
    if fname.is_empty() {
        return Err(AppError::validation("Name is required"));
    }

    if state.db(state.store.find_user_by_email(&email)).await?.is_some() {
        warn!("email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let verification_token = generate_token();
    let new_user = NewUser {
        email,
        fname: fname.to_string(),
        password_hash: hash_password(&req.password)?,
        verification_token: verification_token.clone(),
    };
    let user = state
        .db(state.store.insert_user(&new_user))
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::DuplicateEmail,
            other => AppError::Store(other),
        })?;

    // The account stands even if the mail does not go out.
    let verification_email_sent = state
        .notifier
        .send_verification(&user.email, &verification_token)
        .await
        .is_ok();

    info!(user_id = user.id, verification_email_sent, "user registered");
    Ok(RegisterResponse {
        message: "User registered successfully. Please check your email to verify your account."
            .into(),
        user_id: user.id,
        verification_email_sent,
    })
}

#[instrument(skip(state, keys, req), fields(email = %req.email))]
pub async fn login(
    state: &AppState,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<LoginResponse, AppError> {
    let email = normalize_email(&req.email);
    let Some(user) = state.db(state.store.find_user_by_email(&email)).await? else {
        verify_against_dummy(&req.password);
        warn!("login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = user.id, has_selected_role = user.has_selected_role, "user logged in");
    Ok(LoginResponse {
        user_id: user.id,
        is_verified: user.is_verified,
        has_selected_role: user.has_selected_role,
        role: user.role,
        access_token,
        refresh_token,
    })
}

#[instrument(skip(state, keys, refresh_token))]
pub async fn refresh(
    state: &AppState,
    keys: &JwtKeys,
    refresh_token: &str,
) -> Result<TokenPair, AppError> {
    let claims = keys.verify_refresh(refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid refresh token".into())
    })?;
    let user = current_user(state, claims.sub).await?;

    Ok(TokenPair {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
    })
}

#[instrument(skip_all)]
pub async fn verify_email(state: &AppState, token: Option<&str>) -> Result<i32, AppError> {
    let token = token.map(str::trim).unwrap_or_default();
    if token.is_empty() {
        return Err(AppError::validation("Verification token is required"));
    }
    match state.db(state.store.consume_verification_token(token)).await? {
        Some(user_id) => {
            info!(user_id, "email verified");
            Ok(user_id)
        }
        None => {
            warn!("unknown or used verification token");
            Err(AppError::TokenInvalidOrExpired)
        }
    }
}

/// Stores a fresh reset token for `email`, replacing any earlier one.
pub async fn issue_reset_token(
    state: &AppState,
    email: &str,
    now: OffsetDateTime,
) -> Result<String, AppError> {
    let token = generate_token();
    let stored = state
        .db(state.store.set_reset_token(email, &token, now + RESET_TOKEN_TTL))
        .await?;
    if !stored {
        return Err(AppError::not_found("User not found"));
    }
    Ok(token)
}

/// Swaps in the new password if `token` is live at `now`; returns the account email.
pub async fn consume_reset_token(
    state: &AppState,
    token: &str,
    new_password: &str,
    now: OffsetDateTime,
) -> Result<String, AppError> {
    let password_hash = hash_password(new_password)?;
    state
        .db(state.store.consume_reset_token(token, &password_hash, now))
        .await?
        .ok_or(AppError::TokenInvalidOrExpired)
}

#[instrument(skip(state, email))]
pub async fn forgot_password(
    state: &AppState,
    email: &str,
    now: OffsetDateTime,
) -> Result<(), AppError> {
    let email = normalize_email(email);
    let token = issue_reset_token(state, &email, now).await?;
    let link = state.notifier.reset_link(&token);
    state.notifier.send_password_reset(&email, &link).await?;
    info!("password reset email sent");
    Ok(())
}

#[instrument(skip_all)]
pub async fn change_password(
    state: &AppState,
    req: ChangePasswordRequest,
    now: OffsetDateTime,
) -> Result<(), AppError> {
    if req.token.trim().is_empty() {
        return Err(AppError::TokenInvalidOrExpired);
    }
    if req.new_password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }
    let email = consume_reset_token(state, req.token.trim(), &req.new_password, now).await?;
    info!(email = %email, "password reset");
    Ok(())
}
