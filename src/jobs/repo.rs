use async_trait::async_trait;

use crate::{
    jobs::repo_types::{escape_like, Application, JobFilter, JobPost, NewJobPost},
    store::{PgStore, StoreError},
};

#[async_trait]
pub trait JobRepo: Send + Sync {
    async fn insert_job_post(&self, owner_id: i32, post: &NewJobPost)
        -> Result<JobPost, StoreError>;

    /// Newest first.
    async fn list_job_posts(&self, filter: &JobFilter) -> Result<Vec<JobPost>, StoreError>;

    async fn find_job_post(&self, id: i32) -> Result<Option<JobPost>, StoreError>;

    async fn insert_application(
        &self,
        student_id: i32,
        job_id: i32,
    ) -> Result<Application, StoreError>;
}

const JOB_POST_SELECT: &str = r#"
    SELECT jp.id, jp.user_id, jp.title, jp.description, jp.requirements, jp.status,
           jp.salary, jp.address, COALESCE(c.name, '') AS company_name,
           u.email AS company_email, jp.created_at
      FROM job_posts jp
      JOIN users u ON u.id = jp.user_id
      LEFT JOIN companies c ON c.user_id = jp.user_id
"#;

#[async_trait]
impl JobRepo for PgStore {
    async fn insert_job_post(
        &self,
        owner_id: i32,
        post: &NewJobPost,
    ) -> Result<JobPost, StoreError> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO job_posts (user_id, title, description, requirements, status, salary, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.requirements)
        .bind(&post.status)
        .bind(&post.salary)
        .bind(&post.address)
        .fetch_one(&self.pool)
        .await?;

        let post = sqlx::query_as::<_, JobPost>(&format!("{JOB_POST_SELECT} WHERE jp.id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list_job_posts(&self, filter: &JobFilter) -> Result<Vec<JobPost>, StoreError> {
        let title = filter.title.as_deref().map(escape_like);
        let rows = sqlx::query_as::<_, JobPost>(&format!(
            r#"{JOB_POST_SELECT}
             WHERE ($1::text IS NULL OR jp.title ILIKE '%' || $1 || '%' ESCAPE '\')
               AND ($2::timestamptz IS NULL OR jp.created_at >= $2)
               AND ($3::int IS NULL OR NOT EXISTS (
                     SELECT 1 FROM student_job_applications a
                      WHERE a.job_id = jp.id AND a.user_id = $3))
             ORDER BY jp.created_at DESC, jp.id DESC
            "#
        ))
        .bind(title)
        .bind(filter.created_after)
        .bind(filter.exclude_applied_by)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_job_post(&self, id: i32) -> Result<Option<JobPost>, StoreError> {
        let row = sqlx::query_as::<_, JobPost>(&format!("{JOB_POST_SELECT} WHERE jp.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_application(
        &self,
        student_id: i32,
        job_id: i32,
    ) -> Result<Application, StoreError> {
        let app = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO student_job_applications (user_id, job_id)
            VALUES ($1, $2)
            RETURNING user_id, job_id, created_at
            "#,
        )
        .bind(student_id)
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(app)
    }
}
