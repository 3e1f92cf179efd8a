//! API request/response models for organizations.

use crate::db::models::organizations::{OrganizationCreateDBRequest, OrganizationDBResponse, ProgramOrganizationDBResponse};
use crate::types::{OrganizationId, ProgramId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationCreate {
    /// Org key identifying this organization in the LMS, e.g. "edX"
    pub key: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrganizationId,
    pub key: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgramOrganizationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub program_id: ProgramId,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing organizations
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListOrganizationsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl From<OrganizationCreate> for OrganizationCreateDBRequest {
    fn from(api: OrganizationCreate) -> Self {
        Self {
            key: api.key,
            display_name: api.display_name,
        }
    }
}

impl From<OrganizationDBResponse> for OrganizationResponse {
    fn from(db: OrganizationDBResponse) -> Self {
        Self {
            id: db.id,
            key: db.key,
            display_name: db.display_name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<ProgramOrganizationDBResponse> for ProgramOrganizationResponse {
    fn from(db: ProgramOrganizationDBResponse) -> Self {
        Self {
            program_id: db.program_id,
            organization_id: db.organization_id,
            created_at: db.created_at,
        }
    }
}
