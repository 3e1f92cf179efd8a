//! Shared helpers for unit and integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    api::models::users::Role,
    auth::{identity::UserDirectory, token::Claims},
    catalog::Catalog,
    config::{AuthConfig, Config, JwtConfig},
    db::{
        errors::{DbError, Result as DbResult},
        handlers::{CourseCodes, Organizations, Programs, Repository},
        models::{
            course_codes::{CourseCodeCreateDBRequest, CourseCodeDBResponse, ProgramCourseCodeDBResponse},
            organizations::{OrganizationCreateDBRequest, OrganizationDBResponse},
            programs::{ProgramCreateDBRequest, ProgramDBResponse},
            users::UserDBResponse,
        },
    },
    types::UserId,
};
use crate::api::models::programs::{ProgramCategory, ProgramStatus};

pub const TEST_JWT_SECRET: &str = "registrar-test-secret";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret_key: Some(TEST_JWT_SECRET.to_string()),
        ..Default::default()
    }
}

pub fn test_config() -> Config {
    Config {
        auth: AuthConfig { jwt: test_jwt_config() },
        ..Default::default()
    }
}

/// Sign a token the way the identity provider would.
pub fn mint_token(claims: &Claims, secret: &str) -> String {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("failed to encode test JWT")
}

/// A token for `username` that passes validation, with the given
/// administrator claim.
pub fn mint_user_token(username: &str, administrator: bool) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        preferred_username: Some(username.to_string()),
        administrator,
        exp: Some(now + 300),
        iat: Some(now),
        iss: None,
        sub: None,
        aud: None,
    };
    mint_token(&claims, TEST_JWT_SECRET)
}

/// In-memory [`UserDirectory`] double.
///
/// `with_conflicts(n)` makes the next `n` get_or_create calls fail with a
/// uniqueness violation, simulating concurrent first-time logins racing on
/// the insert.
#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<HashMap<String, UserDBResponse>>,
    conflicts: AtomicU32,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflicts(self, conflicts: u32) -> Self {
        self.conflicts.store(conflicts, Ordering::SeqCst);
        self
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn roles_of(&self, id: UserId) -> Vec<Role> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.id == id)
            .map(|u| u.roles.clone())
            .unwrap_or_default()
    }

    pub fn has_role(&self, id: UserId, role: Role) -> bool {
        self.roles_of(id).contains(&role)
    }
}

fn unique_violation() -> DbError {
    DbError::UniqueViolation {
        constraint: Some("users_username_key".to_string()),
        table: Some("users".to_string()),
        message: "duplicate key value violates unique constraint".to_string(),
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn get_or_create(&self, username: &str) -> DbResult<UserDBResponse> {
        if self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(unique_violation());
        }

        let mut users = self.users.lock().unwrap();
        let now = Utc::now();
        let user = users.entry(username.to_string()).or_insert_with(|| UserDBResponse {
            id: Uuid::new_v4(),
            username: username.to_string(),
            roles: vec![Role::Learner],
            created_at: now,
            updated_at: now,
        });
        Ok(user.clone())
    }

    async fn grant_role(&self, id: UserId, role: Role) -> DbResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.values_mut().find(|u| u.id == id) {
            if !user.roles.contains(&role) {
                user.roles.push(role);
            }
        }
        Ok(())
    }

    async fn revoke_role(&self, id: UserId, role: Role) -> DbResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.values_mut().find(|u| u.id == id) {
            user.roles.retain(|r| *r != role);
        }
        Ok(())
    }
}

// Entity factories for database-backed tests. Names carry a random suffix so
// factories can be called repeatedly against unique-constrained columns.

fn suffix() -> String {
    Uuid::new_v4().to_string().chars().take(8).collect()
}

pub async fn create_test_program(pool: &PgPool) -> ProgramDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    Programs::new(&mut conn)
        .create(&ProgramCreateDBRequest {
            name: format!("Test Program {}", suffix()),
            subtitle: None,
            category: ProgramCategory::MicroMasters,
            status: ProgramStatus::Unpublished,
            marketing_slug: None,
            banner_image_url: None,
        })
        .await
        .unwrap()
}

pub async fn create_test_organization(pool: &PgPool) -> OrganizationDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    let suffix = suffix();
    Organizations::new(&mut conn)
        .create(&OrganizationCreateDBRequest {
            key: format!("test-org-{suffix}"),
            display_name: format!("Test Organization {suffix}"),
        })
        .await
        .unwrap()
}

pub async fn create_test_course_code(pool: &PgPool, organization_id: crate::types::OrganizationId) -> CourseCodeDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    Organizations::new(&mut conn)
        .get_by_id(organization_id)
        .await
        .unwrap()
        .expect("organization must exist before creating course codes");
    CourseCodes::new(&mut conn)
        .create(&CourseCodeCreateDBRequest {
            organization_id,
            key: format!("DemoX-{}", suffix()),
            display_name: "Demonstration Course".to_string(),
        })
        .await
        .unwrap()
}

/// Program + organization + course code, attached: the setup every run-mode
/// test starts from.
pub async fn attach_course_code(pool: &PgPool, catalog: &Catalog) -> ProgramCourseCodeDBResponse {
    let program = create_test_program(pool).await;
    let org = create_test_organization(pool).await;
    catalog.associate_organization(program.id, org.id).await.unwrap();
    let code = create_test_course_code(pool, org.id).await;
    catalog.attach_course_code(program.id, code.id, None).await.unwrap()
}
