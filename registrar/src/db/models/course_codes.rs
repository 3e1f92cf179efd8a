//! Database models for course codes and program curriculum links.

use crate::types::{CourseCodeId, OrganizationId, ProgramCourseCodeId, ProgramId};
use chrono::{DateTime, Utc};

/// Database request for creating a new course code
#[derive(Debug, Clone)]
pub struct CourseCodeCreateDBRequest {
    pub organization_id: OrganizationId,
    pub key: String,
    pub display_name: String,
}

/// Database response for a course code
#[derive(Debug, Clone)]
pub struct CourseCodeDBResponse {
    pub id: CourseCodeId,
    pub organization_id: OrganizationId,
    pub key: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a program/course-code curriculum link
#[derive(Debug, Clone)]
pub struct ProgramCourseCodeDBResponse {
    pub id: ProgramCourseCodeId,
    pub program_id: ProgramId,
    pub course_code_id: CourseCodeId,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}
