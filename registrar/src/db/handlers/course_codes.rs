//! Database repository for course codes and program curriculum links.

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::course_codes::{
            CourseCodeCreateDBRequest, CourseCodeDBResponse, ProgramCourseCodeDBResponse,
        },
    },
    types::{abbrev_uuid, CourseCodeId, OrganizationId, ProgramCourseCodeId, ProgramId},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing course codes
#[derive(Debug, Clone)]
pub struct CourseCodeFilter {
    pub skip: i64,
    pub limit: i64,
    pub organization_id: Option<OrganizationId>,
}

impl CourseCodeFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            organization_id: None,
        }
    }

    pub fn for_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }
}

// Database entity models
#[derive(Debug, Clone, FromRow)]
struct CourseCode {
    pub id: CourseCodeId,
    pub organization_id: OrganizationId,
    pub key: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct ProgramCourseCode {
    pub id: ProgramCourseCodeId,
    pub program_id: ProgramId,
    pub course_code_id: CourseCodeId,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

pub struct CourseCodes<'c> {
    db: &'c mut PgConnection,
}

impl From<CourseCode> for CourseCodeDBResponse {
    fn from(code: CourseCode) -> Self {
        Self {
            id: code.id,
            organization_id: code.organization_id,
            key: code.key,
            display_name: code.display_name,
            created_at: code.created_at,
            updated_at: code.updated_at,
        }
    }
}

impl From<ProgramCourseCode> for ProgramCourseCodeDBResponse {
    fn from(link: ProgramCourseCode) -> Self {
        Self {
            id: link.id,
            program_id: link.program_id,
            course_code_id: link.course_code_id,
            position: link.position,
            created_at: link.created_at,
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for CourseCodes<'c> {
    type CreateRequest = CourseCodeCreateDBRequest;
    type Response = CourseCodeDBResponse;
    type Id = CourseCodeId;
    type Filter = CourseCodeFilter;

    #[instrument(skip(self, request), fields(key = %request.key), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let code = sqlx::query_as::<_, CourseCode>(
            r#"
            INSERT INTO course_codes (id, organization_id, key, display_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.organization_id)
        .bind(&request.key)
        .bind(&request.display_name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(CourseCodeDBResponse::from(code))
    }

    #[instrument(skip(self), fields(course_code_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let code = sqlx::query_as::<_, CourseCode>("SELECT * FROM course_codes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(code.map(CourseCodeDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let codes = sqlx::query_as::<_, CourseCode>(
            r#"
            SELECT * FROM course_codes
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(codes.into_iter().map(CourseCodeDBResponse::from).collect())
    }
}

impl<'c> CourseCodes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(program_course_code_id = %abbrev_uuid(&id)), err)]
    pub async fn get_program_course_code(
        &mut self,
        id: ProgramCourseCodeId,
    ) -> Result<Option<ProgramCourseCodeDBResponse>> {
        let link = sqlx::query_as::<_, ProgramCourseCode>(
            "SELECT * FROM program_course_codes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(link.map(ProgramCourseCodeDBResponse::from))
    }

    /// Curriculum of a program in position order.
    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&program_id)), err)]
    pub async fn list_for_program(
        &mut self,
        program_id: ProgramId,
    ) -> Result<Vec<ProgramCourseCodeDBResponse>> {
        let links = sqlx::query_as::<_, ProgramCourseCode>(
            "SELECT * FROM program_course_codes WHERE program_id = $1 ORDER BY position",
        )
        .bind(program_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(links.into_iter().map(ProgramCourseCodeDBResponse::from).collect())
    }

    /// Whether the course code is already part of any program's curriculum.
    #[instrument(skip(self), fields(course_code_id = %abbrev_uuid(&course_code_id)), err)]
    pub async fn in_any_program(&mut self, course_code_id: CourseCodeId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM program_course_codes WHERE course_code_id = $1)",
        )
        .bind(course_code_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    /// Highest position currently allocated in the program, if any.
    ///
    /// Positions are allocated from the historical maximum, so a position is
    /// never reused even if rows were removed out-of-band.
    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&program_id)), err)]
    pub async fn max_position(&mut self, program_id: ProgramId) -> Result<Option<i32>> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(position) FROM program_course_codes WHERE program_id = $1",
        )
        .bind(program_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(max)
    }

    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&program_id), position), err)]
    pub async fn attach_to_program(
        &mut self,
        program_id: ProgramId,
        course_code_id: CourseCodeId,
        position: i32,
    ) -> Result<ProgramCourseCodeDBResponse> {
        let link = sqlx::query_as::<_, ProgramCourseCode>(
            r#"
            INSERT INTO program_course_codes (id, program_id, course_code_id, position)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(program_id)
        .bind(course_code_id)
        .bind(position)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ProgramCourseCodeDBResponse::from(link))
    }
}
