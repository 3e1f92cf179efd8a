//! Database models for programs.

use crate::api::models::programs::{ProgramCategory, ProgramStatus};
use crate::types::ProgramId;
use chrono::{DateTime, Utc};

/// Database request for creating a new program
#[derive(Debug, Clone)]
pub struct ProgramCreateDBRequest {
    pub name: String,
    pub subtitle: Option<String>,
    pub category: ProgramCategory,
    pub status: ProgramStatus,
    pub marketing_slug: Option<String>,
    pub banner_image_url: Option<String>,
}

/// Database request for updating a program. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProgramUpdateDBRequest {
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub status: Option<ProgramStatus>,
    pub marketing_slug: Option<String>,
    pub banner_image_url: Option<String>,
}

/// Database response for a program
#[derive(Debug, Clone)]
pub struct ProgramDBResponse {
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
