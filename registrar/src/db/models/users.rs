//! Database models for users.

use crate::api::models::users::Role;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub roles: Vec<Role>,
}

/// Database response for a user.
///
/// Serializable because the role-synchronizer pipeline step emits it inside
/// its `{"user": ...}` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
