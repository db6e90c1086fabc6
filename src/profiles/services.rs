use tracing::{info, instrument, warn};

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{AccountState, Role, User},
        services::current_user,
    },
    error::AppError,
    profiles::{
        dto::UserDetails,
        repo::ProfileRepo,
        repo_types::{
            CompanyDetails, CompanyProfile, EducationEntry, ExperienceEntry, NewStudentProfile,
            RoleSelection, StudentDetails, MAX_DESCRIPTION_CHARS,
        },
    },
    state::AppState,
};

/// Only a verified account without a role may pick one.
fn ensure_can_select_role(user: &User) -> Result<(), AppError> {
    match user.state() {
        AccountState::VerifiedNoRole => Ok(()),
        AccountState::Unverified => Err(AppError::Forbidden("Email not verified".into())),
        AccountState::VerifiedStudent | AccountState::VerifiedCompany => {
            Err(AppError::AlreadyHasRole)
        }
    }
}

fn selection_result(selection: RoleSelection) -> Result<(), AppError> {
    match selection {
        RoleSelection::Selected => Ok(()),
        RoleSelection::AlreadySelected => Err(AppError::AlreadyHasRole),
        RoleSelection::UnknownUser => Err(AppError::not_found("User not found")),
    }
}

fn check_description(description: Option<&str>) -> Result<(), AppError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_CHARS => Err(AppError::validation(
            format!("Description must be at most {MAX_DESCRIPTION_CHARS} characters"),
        )),
        _ => Ok(()),
    }
}

fn check_company(profile: &CompanyProfile) -> Result<(), AppError> {
    if profile.name.trim().is_empty() {
        return Err(AppError::validation("Company name is required"));
    }
    Ok(())
}

async fn find_user(state: &AppState, user_id: i32) -> Result<User, AppError> {
    state
        .db(state.store.find_user_by_id(user_id))
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

#[instrument(skip(state, profile), fields(jobs = profile.jobs.len(), education = profile.education.len()))]
pub async fn register_student(
    state: &AppState,
    user_id: i32,
    profile: NewStudentProfile,
) -> Result<(), AppError> {
    check_description(profile.description.as_deref())?;
    let user = find_user(state, user_id).await?;
    ensure_can_select_role(&user)?;

    let selection = state
        .db(state.store.register_student(user_id, &profile))
        .await?;
    selection_result(selection)?;
    info!("student registration successful");
    Ok(())
}

#[instrument(skip(state, profile))]
pub async fn register_company(
    state: &AppState,
    user_id: i32,
    profile: CompanyProfile,
) -> Result<(), AppError> {
    check_company(&profile)?;
    let user = find_user(state, user_id).await?;
    ensure_can_select_role(&user)?;

    let selection = state
        .db(state.store.register_company(user_id, &profile))
        .await?;
    selection_result(selection)?;
    info!("company registration successful");
    Ok(())
}

#[instrument(skip(state))]
pub async fn user_details(state: &AppState, user_id: i32) -> Result<UserDetails, AppError> {
    let user = find_user(state, user_id).await?;
    match user.role {
        Some(Role::Student) => Ok(UserDetails::Student(student(state, user_id).await?)),
        Some(Role::Company) => Ok(UserDetails::Company(company(state, user_id).await?)),
        None => {
            warn!("user has no role yet");
            Err(AppError::validation("Invalid user role"))
        }
    }
}

pub async fn user_role(state: &AppState, user_id: i32) -> Result<Option<Role>, AppError> {
    Ok(find_user(state, user_id).await?.role)
}

pub async fn student(state: &AppState, user_id: i32) -> Result<StudentDetails, AppError> {
    state
        .db(state.store.student_details(user_id))
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))
}

pub async fn company(state: &AppState, user_id: i32) -> Result<CompanyDetails, AppError> {
    state
        .db(state.store.company_details(user_id))
        .await?
        .ok_or_else(|| AppError::not_found("Company not found"))
}

pub async fn list_students(state: &AppState) -> Result<Vec<StudentDetails>, AppError> {
    Ok(state.db(state.store.list_students()).await?)
}

#[instrument(skip(state, entry))]
pub async fn update_experience(
    state: &AppState,
    user_id: i32,
    entry_id: i32,
    entry: ExperienceEntry,
) -> Result<(), AppError> {
    let updated = state
        .db(state.store.update_experience(user_id, entry_id, &entry))
        .await?;
    if !updated {
        return Err(AppError::not_found("Experience entry not found"));
    }
    info!("experience entry updated");
    Ok(())
}

#[instrument(skip(state, entry))]
pub async fn update_education(
    state: &AppState,
    user_id: i32,
    entry_id: i32,
    entry: EducationEntry,
) -> Result<(), AppError> {
    let updated = state
        .db(state.store.update_education(user_id, entry_id, &entry))
        .await?;
    if !updated {
        return Err(AppError::not_found("Education entry not found"));
    }
    info!("education entry updated");
    Ok(())
}

#[instrument(skip(state, profile))]
pub async fn update_company(
    state: &AppState,
    user_id: i32,
    profile: CompanyProfile,
) -> Result<(), AppError> {
    check_company(&profile)?;
    let user = current_user(state, user_id).await?;
    if user.role != Some(Role::Company) {
        return Err(AppError::Forbidden(
            "Only companies can edit a company profile".into(),
        ));
    }
    let updated = state
        .db(state.store.update_company(user_id, &profile))
        .await?;
    if !updated {
        return Err(AppError::not_found("Company not found"));
    }
    info!("company profile updated");
    Ok(())
}
