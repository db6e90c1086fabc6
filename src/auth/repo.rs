use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::repo_types::{NewUser, User, UserRow},
    store::{unique_violation, PgStore, StoreError},
};

const USER_COLUMNS: &str = "id, email, fname, password_hash, is_verified, verification_token, \
     reset_token, reset_token_expires, has_selected_role, role, instagram_url, facebook_url, \
     twitter_url, linkedin_url, created_at, updated_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    /// Fails with `StoreError::Conflict` when the email is taken.
    async fn insert_user(&self, new: &NewUser) -> Result<User, StoreError>;

    /// Marks the owner of `token` verified and clears the token. Returns the user id.
    async fn consume_verification_token(&self, token: &str) -> Result<Option<i32>, StoreError>;

    /// Overwrites any outstanding reset token. Returns false when no user has `email`.
    async fn set_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<bool, StoreError>;

    /// Swaps in `password_hash` and clears the reset pair if `token` is live at `now`.
    /// Returns the owner's email.
    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<String>, StoreError>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert_user(&self, new: &NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, fname, password_hash, verification_token)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.fname)
        .bind(&new.password_hash)
        .bind(&new.verification_token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "users.email"))?;
        User::try_from(row)
    }

    async fn consume_verification_token(&self, token: &str) -> Result<Option<i32>, StoreError> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
               SET is_verified = TRUE, verification_token = NULL, updated_at = now()
             WHERE verification_token = $1
            RETURNING id
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET reset_token = $1, reset_token_expires = $2, updated_at = now()
             WHERE email = $3
            "#,
        )
        .bind(token)
        .bind(expires_at)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<String>, StoreError> {
        // One conditional statement: two concurrent consumers cannot both match.
        let email = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE users
               SET password_hash = $2, reset_token = NULL, reset_token_expires = NULL,
                   updated_at = now()
             WHERE reset_token = $1 AND reset_token_expires > $3
            RETURNING email
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(email)
    }
}
