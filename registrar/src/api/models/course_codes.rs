//! API request/response models for course codes and their program links.

use crate::db::models::course_codes::{
    CourseCodeCreateDBRequest, CourseCodeDBResponse, ProgramCourseCodeDBResponse,
};
use crate::types::{CourseCodeId, OrganizationId, ProgramCourseCodeId, ProgramId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseCodeCreate {
    /// The 'course' part of course keys associated with this course code,
    /// for example "DemoX" in "edX/DemoX/Demo_2014"
    pub key: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseCodeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CourseCodeId,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrganizationId,
    pub key: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for attaching a course code to a program's curriculum.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgramCourseCodeCreate {
    #[schema(value_type = String, format = "uuid")]
    pub course_code_id: CourseCodeId,
    /// Ordering position within the program; allocated as max+1 when unset
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgramCourseCodeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProgramCourseCodeId,
    #[schema(value_type = String, format = "uuid")]
    pub program_id: ProgramId,
    #[schema(value_type = String, format = "uuid")]
    pub course_code_id: CourseCodeId,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl CourseCodeCreate {
    pub fn into_db_request(self, organization_id: OrganizationId) -> CourseCodeCreateDBRequest {
        CourseCodeCreateDBRequest {
            organization_id,
            key: self.key,
            display_name: self.display_name,
        }
    }
}

impl From<CourseCodeDBResponse> for CourseCodeResponse {
    fn from(db: CourseCodeDBResponse) -> Self {
        Self {
            id: db.id,
            organization_id: db.organization_id,
            key: db.key,
            display_name: db.display_name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<ProgramCourseCodeDBResponse> for ProgramCourseCodeResponse {
    fn from(db: ProgramCourseCodeDBResponse) -> Self {
        Self {
            id: db.id,
            program_id: db.program_id,
            course_code_id: db.course_code_id,
            position: db.position,
            created_at: db.created_at,
        }
    }
}
