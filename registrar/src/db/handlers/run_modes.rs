//! Database repository for course run modes.

use crate::{
    db::{
        errors::Result,
        models::run_modes::{RunModeCreateDBRequest, RunModeDBResponse},
    },
    types::{abbrev_uuid, ProgramCourseCodeId},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct RunMode {
    pub id: Uuid,
    pub program_course_code_id: ProgramCourseCodeId,
    pub lms_url: Option<String>,
    pub course_key: String,
    pub run_key: String,
    pub mode_slug: String,
    pub sku: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct RunModes<'c> {
    db: &'c mut PgConnection,
}

impl From<RunMode> for RunModeDBResponse {
    fn from(rm: RunMode) -> Self {
        Self {
            id: rm.id,
            program_course_code_id: rm.program_course_code_id,
            lms_url: rm.lms_url,
            course_key: rm.course_key,
            run_key: rm.run_key,
            mode_slug: rm.mode_slug,
            sku: rm.sku,
            start_date: rm.start_date,
            created_at: rm.created_at,
            updated_at: rm.updated_at,
        }
    }
}

impl<'c> RunModes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Probe for an existing row with the same run-mode tuple.
    ///
    /// `IS NOT DISTINCT FROM` makes the sku comparison equality-inclusive:
    /// two NULL skus compare equal here, which the table's unique constraint
    /// does not catch.
    #[instrument(skip(self), fields(program_course_code_id = %abbrev_uuid(&program_course_code_id)), err)]
    pub async fn duplicate_exists(
        &mut self,
        program_course_code_id: ProgramCourseCodeId,
        course_key: &str,
        mode_slug: &str,
        sku: Option<&str>,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM program_course_run_modes
                WHERE program_course_code_id = $1
                  AND course_key = $2
                  AND mode_slug = $3
                  AND sku IS NOT DISTINCT FROM $4
            )
            "#,
        )
        .bind(program_course_code_id)
        .bind(course_key)
        .bind(mode_slug)
        .bind(sku)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self, request), fields(course_key = %request.course_key, mode_slug = %request.mode_slug), err)]
    pub async fn create(&mut self, request: &RunModeCreateDBRequest, run_key: &str) -> Result<RunModeDBResponse> {
        let rm = sqlx::query_as::<_, RunMode>(
            r#"
            INSERT INTO program_course_run_modes
                (id, program_course_code_id, lms_url, course_key, run_key, mode_slug, sku, start_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.program_course_code_id)
        .bind(&request.lms_url)
        .bind(&request.course_key)
        .bind(run_key)
        .bind(&request.mode_slug)
        .bind(&request.sku)
        .bind(request.start_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(RunModeDBResponse::from(rm))
    }

    #[instrument(skip(self), fields(program_course_code_id = %abbrev_uuid(&program_course_code_id)), err)]
    pub async fn list_for_program_course_code(
        &mut self,
        program_course_code_id: ProgramCourseCodeId,
    ) -> Result<Vec<RunModeDBResponse>> {
        let rows = sqlx::query_as::<_, RunMode>(
            "SELECT * FROM program_course_run_modes WHERE program_course_code_id = $1 ORDER BY created_at",
        )
        .bind(program_course_code_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.into_iter().map(RunModeDBResponse::from).collect())
    }
}
