//! Database repository for programs.

use crate::{
    api::models::programs::{ProgramCategory, ProgramStatus},
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::programs::{ProgramCreateDBRequest, ProgramDBResponse, ProgramUpdateDBRequest},
    },
    types::{abbrev_uuid, ProgramId},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing programs
#[derive(Debug, Clone)]
pub struct ProgramFilter {
    pub skip: i64,
    pub limit: i64,
    pub status: Option<ProgramStatus>,
    pub category: Option<ProgramCategory>,
}

impl ProgramFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            status: None,
            category: None,
        }
    }

    pub fn with_status(mut self, status: ProgramStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: ProgramCategory) -> Self {
        self.category = Some(category);
        self
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Program {
    pub id: ProgramId,
    pub name: String,
    pub subtitle: Option<String>,
    pub category: ProgramCategory,
    pub status: ProgramStatus,
    pub marketing_slug: Option<String>,
    pub banner_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Programs<'c> {
    db: &'c mut PgConnection,
}

impl From<Program> for ProgramDBResponse {
    fn from(program: Program) -> Self {
        Self {
            id: program.id,
            name: program.name,
            subtitle: program.subtitle,
            category: program.category,
            status: program.status,
            marketing_slug: program.marketing_slug,
            banner_image_url: program.banner_image_url,
            created_at: program.created_at,
            updated_at: program.updated_at,
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Programs<'c> {
    type CreateRequest = ProgramCreateDBRequest;
    type Response = ProgramDBResponse;
    type Id = ProgramId;
    type Filter = ProgramFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let program = sqlx::query_as::<_, Program>(
            r#"
            INSERT INTO programs (id, name, subtitle, category, status, marketing_slug, banner_image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.subtitle)
        .bind(request.category)
        .bind(request.status)
        .bind(&request.marketing_slug)
        .bind(&request.banner_image_url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ProgramDBResponse::from(program))
    }

    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let program = sqlx::query_as::<_, Program>("SELECT * FROM programs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(program.map(ProgramDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        // The (status, category) pair is indexed; both filters are optional.
        let programs = sqlx::query_as::<_, Program>(
            r#"
            SELECT * FROM programs
            WHERE ($1::program_status IS NULL OR status = $1)
              AND ($2::program_category IS NULL OR category = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.status)
        .bind(filter.category)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(programs.into_iter().map(ProgramDBResponse::from).collect())
    }
}

impl<'c> Programs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(program_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: ProgramId, request: &ProgramUpdateDBRequest) -> Result<ProgramDBResponse> {
        // Atomic update with conditional field updates
        let program = sqlx::query_as::<_, Program>(
            r#"
            UPDATE programs SET
                name = COALESCE($2, name),
                subtitle = COALESCE($3, subtitle),
                status = COALESCE($4, status),
                marketing_slug = COALESCE($5, marketing_slug),
                banner_image_url = COALESCE($6, banner_image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.subtitle)
        .bind(request.status)
        .bind(&request.marketing_slug)
        .bind(&request.banner_image_url)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(ProgramDBResponse::from(program))
    }
}
