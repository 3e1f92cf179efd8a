//! Database models for course run modes.

use crate::types::{ProgramCourseCodeId, RunModeId};
use chrono::{DateTime, Utc};

/// Database request for creating a new run mode. The `run_key` is not part of
/// the request: it is derived from `course_key` by the catalog write path.
#[derive(Debug, Clone)]
pub struct RunModeCreateDBRequest {
    pub program_course_code_id: ProgramCourseCodeId,
    pub lms_url: Option<String>,
    pub course_key: String,
    pub mode_slug: String,
    pub sku: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
}

/// Database response for a run mode
#[derive(Debug, Clone)]
pub struct RunModeDBResponse {
    pub id: RunModeId,
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
