//! API request/response models for course run modes.

use crate::db::models::run_modes::{RunModeCreateDBRequest, RunModeDBResponse};
use crate::types::{ProgramCourseCodeId, RunModeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunModeCreate {
    /// URL of the LMS where this course run / mode is being offered
    #[schema(value_type = Option<String>, format = "uri")]
    pub lms_url: Option<Url>,
    /// Course key identifying this run in the target LMS,
    /// e.g. "course-v1:edX+DemoX+Demo_2014"
    pub course_key: String,
    /// The mode_slug value which uniquely identifies the mode in the target
    /// LMS, e.g. "verified"
    pub mode_slug: String,
    /// The sku associated with this run/mode in the ecommerce system
    pub sku: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunModeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RunModeId,
    #[schema(value_type = String, format = "uuid")]
    pub program_course_code_id: ProgramCourseCodeId,
    pub lms_url: Option<String>,
    pub course_key: String,
    /// The run segment parsed out of course_key, e.g. "Demo_2014"
    pub run_key: String,
    pub mode_slug: String,
    pub sku: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunModeCreate {
    pub fn into_db_request(self, program_course_code_id: ProgramCourseCodeId) -> RunModeCreateDBRequest {
        RunModeCreateDBRequest {
            program_course_code_id,
            lms_url: self.lms_url.map(|url| url.to_string()),
            course_key: self.course_key,
            mode_slug: self.mode_slug,
            sku: self.sku,
            start_date: self.start_date,
        }
    }
}

impl From<RunModeDBResponse> for RunModeResponse {
    fn from(db: RunModeDBResponse) -> Self {
        Self {
            id: db.id,
            program_course_code_id: db.program_course_code_id,
            lms_url: db.lms_url,
            course_key: db.course_key,
            run_key: db.run_key,
            mode_slug: db.mode_slug,
            sku: db.sku,
            start_date: db.start_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
