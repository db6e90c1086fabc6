use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    auth::repo_types::Role,
    profiles::repo_types::{
        CompanyDetails, CompanyProfile, CompanyRow, Education, EducationEntry, Experience,
        ExperienceEntry, NewStudentProfile, RoleSelection, StudentDetails, StudentRow,
    },
    store::{PgStore, StoreError},
};

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    /// Inserts the student profile with its history and flips the role flag,
    /// all or nothing.
    async fn register_student(
        &self,
        user_id: i32,
        profile: &NewStudentProfile,
    ) -> Result<RoleSelection, StoreError>;

    async fn register_company(
        &self,
        user_id: i32,
        profile: &CompanyProfile,
    ) -> Result<RoleSelection, StoreError>;

    async fn student_details(&self, user_id: i32) -> Result<Option<StudentDetails>, StoreError>;

    async fn company_details(&self, user_id: i32) -> Result<Option<CompanyDetails>, StoreError>;

    async fn list_students(&self) -> Result<Vec<StudentDetails>, StoreError>;

    /// Returns false when no entry with `entry_id` belongs to `user_id`.
    async fn update_experience(
        &self,
        user_id: i32,
        entry_id: i32,
        entry: &ExperienceEntry,
    ) -> Result<bool, StoreError>;

    async fn update_education(
        &self,
        user_id: i32,
        entry_id: i32,
        entry: &EducationEntry,
    ) -> Result<bool, StoreError>;

    async fn update_company(
        &self,
        user_id: i32,
        profile: &CompanyProfile,
    ) -> Result<bool, StoreError>;
}

/// Locks the user row for the rest of the transaction and reports whether a
/// role may still be selected.
async fn lock_for_role_selection(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
) -> Result<RoleSelection, StoreError> {
    let selected = sqlx::query_scalar::<_, bool>(
        "SELECT has_selected_role FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(match selected {
        None => RoleSelection::UnknownUser,
        Some(true) => RoleSelection::AlreadySelected,
        Some(false) => RoleSelection::Selected,
    })
}

async fn set_role_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    role: Role,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        UPDATE users
           SET has_selected_role = TRUE, role = $2, updated_at = now()
         WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_experience_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    job: &ExperienceEntry,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO jobs (user_id, title, company, start_date, end_date, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(&job.title)
    .bind(&job.company)
    .bind(&job.start_date)
    .bind(&job.end_date)
    .bind(&job.description)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_education_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    edu: &EducationEntry,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO education
            (user_id, school, degree, field_of_study, start_date, end_date, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(user_id)
    .bind(&edu.school)
    .bind(&edu.degree)
    .bind(&edu.field_of_study)
    .bind(&edu.start_date)
    .bind(&edu.end_date)
    .bind(&edu.description)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn history_for(
    db: &PgPool,
    user_id: i32,
) -> Result<(Vec<Experience>, Vec<Education>), StoreError> {
    let jobs = sqlx::query_as::<_, Experience>(
        r#"
        SELECT id, title, company, start_date, end_date, description
          FROM jobs
         WHERE user_id = $1
         ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let education = sqlx::query_as::<_, Education>(
        r#"
        SELECT id, school, degree, field_of_study, start_date, end_date, description
          FROM education
         WHERE user_id = $1
         ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok((jobs, education))
}

const STUDENT_SELECT: &str = r#"
    SELECT u.id, u.email, u.fname, s.description, s.profile_image, s.is_cv_created, s.cv_path
      FROM users u
      JOIN students s ON s.user_id = u.id
"#;

#[async_trait]
impl ProfileRepo for PgStore {
    async fn register_student(
        &self,
        user_id: i32,
        profile: &NewStudentProfile,
    ) -> Result<RoleSelection, StoreError> {
        // Dropping `tx` without commit rolls every statement back.
        let mut tx = self.pool.begin().await?;
        let selection = lock_for_role_selection(&mut tx, user_id).await?;
        if selection != RoleSelection::Selected {
            return Ok(selection);
        }

        sqlx::query(
            "INSERT INTO students (user_id, description, profile_image) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(&profile.description)
        .bind(&profile.image_path)
        .execute(&mut *tx)
        .await?;
        for job in &profile.jobs {
            insert_experience_tx(&mut tx, user_id, job).await?;
        }
        for edu in &profile.education {
            insert_education_tx(&mut tx, user_id, edu).await?;
        }
        set_role_tx(&mut tx, user_id, Role::Student).await?;

        tx.commit().await?;
        Ok(RoleSelection::Selected)
    }

    async fn register_company(
        &self,
        user_id: i32,
        profile: &CompanyProfile,
    ) -> Result<RoleSelection, StoreError> {
        let mut tx = self.pool.begin().await?;
        let selection = lock_for_role_selection(&mut tx, user_id).await?;
        if selection != RoleSelection::Selected {
            return Ok(selection);
        }

        sqlx::query(
            r#"
            INSERT INTO companies
                (user_id, name, size, address, description, image_path, video_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user_id)
        .bind(&profile.name)
        .bind(&profile.size)
        .bind(&profile.address)
        .bind(&profile.description)
        .bind(&profile.image_path)
        .bind(&profile.video_path)
        .execute(&mut *tx)
        .await?;
        set_role_tx(&mut tx, user_id, Role::Company).await?;

        tx.commit().await?;
        Ok(RoleSelection::Selected)
    }

    async fn student_details(&self, user_id: i32) -> Result<Option<StudentDetails>, StoreError> {
        let row = sqlx::query_as::<_, StudentRow>(&format!("{STUDENT_SELECT} WHERE u.id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let (jobs, education) = history_for(&self.pool, row.id).await?;
        Ok(Some(StudentDetails::from_parts(row, jobs, education)))
    }

    async fn company_details(&self, user_id: i32) -> Result<Option<CompanyDetails>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT c.user_id, u.email, u.fname, c.name, c.size, c.address, c.description,
                   c.image_path, c.video_path
              FROM companies c
              JOIN users u ON u.id = c.user_id
             WHERE c.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CompanyDetails::from))
    }

    async fn list_students(&self) -> Result<Vec<StudentDetails>, StoreError> {
        let rows = sqlx::query_as::<_, StudentRow>(&format!(
            "{STUDENT_SELECT} WHERE u.role = 'student' ORDER BY u.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let (jobs, education) = history_for(&self.pool, row.id).await?;
            out.push(StudentDetails::from_parts(row, jobs, education));
        }
        Ok(out)
    }

    async fn update_experience(
        &self,
        user_id: i32,
        entry_id: i32,
        entry: &ExperienceEntry,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE jobs
               SET title = $1, company = $2, start_date = $3, end_date = $4,
                   description = $5, updated_at = now()
             WHERE id = $6 AND user_id = $7
            "#,
        )
        .bind(&entry.title)
        .bind(&entry.company)
        .bind(&entry.start_date)
        .bind(&entry.end_date)
        .bind(&entry.description)
        .bind(entry_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_education(
        &self,
        user_id: i32,
        entry_id: i32,
        entry: &EducationEntry,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE education
               SET school = $1, degree = $2, field_of_study = $3, start_date = $4,
                   end_date = $5, description = $6, updated_at = now()
             WHERE id = $7 AND user_id = $8
            "#,
        )
        .bind(&entry.school)
        .bind(&entry.degree)
        .bind(&entry.field_of_study)
        .bind(&entry.start_date)
        .bind(&entry.end_date)
        .bind(&entry.description)
        .bind(entry_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_company(
        &self,
        user_id: i32,
        profile: &CompanyProfile,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE companies
               SET name = $2, size = $3, address = $4, description = $5,
                   image_path = $6, video_path = $7, updated_at = now()
             WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&profile.name)
        .bind(&profile.size)
        .bind(&profile.address)
        .bind(&profile.description)
        .bind(&profile.image_path)
        .bind(&profile.video_path)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}
