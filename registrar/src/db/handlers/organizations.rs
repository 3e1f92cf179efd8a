//! Database repository for organizations and program associations.

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::organizations::{
            OrganizationCreateDBRequest, OrganizationDBResponse, ProgramOrganizationDBResponse,
        },
    },
    types::{abbrev_uuid, OrganizationId, ProgramId},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing organizations
#[derive(Debug, Clone)]
pub struct OrganizationFilter {
    pub skip: i64,
    pub limit: i64,
}

impl OrganizationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

// Database entity models
#[derive(Debug, Clone, FromRow)]
struct Organization {
    pub id: OrganizationId,
    pub key: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct ProgramOrganization {
    pub id: Uuid,
    pub program_id: ProgramId,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
}

pub struct Organizations<'c> {
    db: &'c mut PgConnection,
}

impl From<Organization> for OrganizationDBResponse {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            key: org.key,
            display_name: org.display_name,
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

impl From<ProgramOrganization> for ProgramOrganizationDBResponse {
    fn from(link: ProgramOrganization) -> Self {
        Self {
            id: link.id,
            program_id: link.program_id,
            organization_id: link.organization_id,
            created_at: link.created_at,
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Organizations<'c> {
    type CreateRequest = OrganizationCreateDBRequest;
    type Response = OrganizationDBResponse;
    type Id = OrganizationId;
    type Filter = OrganizationFilter;

    #[instrument(skip(self, request), fields(key = %request.key), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (id, key, display_name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.key)
        .bind(&request.display_name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(OrganizationDBResponse::from(org))
    }

    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(org.map(OrganizationDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let orgs = sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(orgs.into_iter().map(OrganizationDBResponse::from).collect())
    }
}

impl<'c> Organizations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// The organization association for a program, if any. A program has at
    /// most one; the catalog write path enforces that before insert.
    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&program_id)), err)]
    pub async fn program_association(
        &mut self,
        program_id: ProgramId,
    ) -> Result<Option<ProgramOrganizationDBResponse>> {
        let link = sqlx::query_as::<_, ProgramOrganization>(
            "SELECT * FROM program_organizations WHERE program_id = $1",
        )
        .bind(program_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(link.map(ProgramOrganizationDBResponse::from))
    }

    /// Whether the given organization is associated with the given program.
    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&program_id)), err)]
    pub async fn is_program_organization(
        &mut self,
        program_id: ProgramId,
        organization_id: OrganizationId,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM program_organizations WHERE program_id = $1 AND organization_id = $2)",
        )
        .bind(program_id)
        .bind(organization_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&program_id)), err)]
    pub async fn associate_program(
        &mut self,
        program_id: ProgramId,
        organization_id: OrganizationId,
    ) -> Result<ProgramOrganizationDBResponse> {
        let link = sqlx::query_as::<_, ProgramOrganization>(
            r#"
            INSERT INTO program_organizations (id, program_id, organization_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(program_id)
        .bind(organization_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ProgramOrganizationDBResponse::from(link))
    }
}
