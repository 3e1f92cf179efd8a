//! Database models for organizations and program associations.

use crate::types::{OrganizationId, ProgramId, ProgramOrganizationId};
use chrono::{DateTime, Utc};

/// Database request for creating a new organization
#[derive(Debug, Clone)]
pub struct OrganizationCreateDBRequest {
    pub key: String,
    pub display_name: String,
}

/// Database response for an organization
#[derive(Debug, Clone)]
pub struct OrganizationDBResponse {
    pub id: OrganizationId,
    pub key: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a program/organization association row
#[derive(Debug, Clone)]
pub struct ProgramOrganizationDBResponse {
    pub id: ProgramOrganizationId,
    pub program_id: ProgramId,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
}
