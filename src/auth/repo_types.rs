use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::store::StoreError;

/// Which profile table governs an account once a role is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Company,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "company" => Ok(Role::Company),
            other => Err(StoreError::Decode(format!("unknown role {other:?}"))),
        }
    }
}

/// Position of a user in the registration lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Unverified,
    VerifiedNoRole,
    VerifiedStudent,
    VerifiedCompany,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub fname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires: Option<OffsetDateTime>,
    pub has_selected_role: bool,
    pub role: Option<Role>,
    pub instagram_url: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn state(&self) -> AccountState {
        if !self.is_verified {
            return AccountState::Unverified;
        }
        match self.role {
            None => AccountState::VerifiedNoRole,
            Some(Role::Student) => AccountState::VerifiedStudent,
            Some(Role::Company) => AccountState::VerifiedCompany,
        }
    }
}

/// Raw `users` row; `role` is stored as text.
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i32,
    pub email: String,
    pub fname: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<OffsetDateTime>,
    pub has_selected_role: bool,
    pub role: Option<String>,
    pub instagram_url: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r.role.as_deref().map(str::parse).transpose()?;
        Ok(Self {
            id: r.id,
            email: r.email,
            fname: r.fname,
            password_hash: r.password_hash,
            is_verified: r.is_verified,
            verification_token: r.verification_token,
            reset_token: r.reset_token,
            reset_token_expires: r.reset_token_expires,
            has_selected_role: r.has_selected_role,
            role,
            instagram_url: r.instagram_url,
            facebook_url: r.facebook_url,
            twitter_url: r.twitter_url,
            linkedin_url: r.linkedin_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Values needed to insert a fresh, unverified user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub fname: String,
    pub password_hash: String,
    pub verification_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!(Role::Company.as_str(), "company");
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Company).unwrap();
        assert_eq!(json, "\"company\"");
    }
}
