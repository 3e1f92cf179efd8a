//! Database model for the program defaults singleton.

use chrono::{DateTime, Utc};

/// The single well-known configuration record holding catalog-wide fallbacks.
#[derive(Debug, Clone)]
pub struct ProgramDefaultDBResponse {
    pub banner_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}
