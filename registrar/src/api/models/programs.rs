//! API request/response models for programs.

use crate::db::models::programs::{ProgramCreateDBRequest, ProgramDBResponse, ProgramUpdateDBRequest};
use crate::types::{OrganizationId, ProgramId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// The category / type of a program.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "program_category")]
pub enum ProgramCategory {
    XSeries,
    MicroMasters,
}

/// The lifecycle status of a program.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "program_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProgramStatus {
    Unpublished,
    Active,
    Retired,
    Deleted,
}

impl Default for ProgramStatus {
    fn default() -> Self {
        ProgramStatus::Unpublished
    }
}

// Program request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgramCreate {
    pub name: String,
    pub subtitle: Option<String>,
    pub category: ProgramCategory,
    #[serde(default)]
    pub status: ProgramStatus,
    pub marketing_slug: Option<String>,
    pub banner_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgramUpdate {
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub status: Option<ProgramStatus>,
    pub marketing_slug: Option<String>,
    pub banner_image_url: Option<String>,
}

// Program response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgramResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProgramId,
    pub name: String,
    pub subtitle: Option<String>,
    pub category: ProgramCategory,
    pub status: ProgramStatus,
    pub marketing_slug: Option<String>,
    /// The program's own banner if set, otherwise the catalog-wide default.
    pub banner_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgramResponse {
    /// Build a response, falling back to the default banner when the program
    /// has none of its own.
    pub fn with_default_banner(db: ProgramDBResponse, default_banner: Option<String>) -> Self {
        let banner_image_url = db.banner_image_url.or(default_banner);
        Self {
            id: db.id,
            name: db.name,
            subtitle: db.subtitle,
            category: db.category,
            status: db.status,
            marketing_slug: db.marketing_slug,
            banner_image_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing programs
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListProgramsQuery {
    /// Number of programs to skip
    pub skip: Option<i64>,
    /// Maximum number of programs to return
    pub limit: Option<i64>,
    /// Restrict to a lifecycle status
    pub status: Option<ProgramStatus>,
    /// Restrict to a category
    pub category: Option<ProgramCategory>,
}

/// Request body for associating an organization with a program.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgramOrganizationCreate {
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrganizationId,
}

impl From<ProgramCreate> for ProgramCreateDBRequest {
    fn from(api: ProgramCreate) -> Self {
        Self {
            name: api.name,
            subtitle: api.subtitle,
            category: api.category,
            status: api.status,
            marketing_slug: api.marketing_slug,
            banner_image_url: api.banner_image_url,
        }
    }
}

impl From<ProgramUpdate> for ProgramUpdateDBRequest {
    fn from(api: ProgramUpdate) -> Self {
        Self {
            name: api.name,
            subtitle: api.subtitle,
            status: api.status,
            marketing_slug: api.marketing_slug,
            banner_image_url: api.banner_image_url,
        }
    }
}
