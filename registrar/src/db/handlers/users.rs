//! Database repository for users and their role rows.

use crate::{
    api::models::users::Role,
    db::{
        errors::Result,
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    types::{abbrev_uuid, UserId},
};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl From<(Vec<Role>, User)> for UserDBResponse {
    fn from((roles, user): (Vec<Role>, User)) -> Self {
        Self {
            id: user.id,
            username: user.username,
            roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a new user together with its baseline role rows.
    ///
    /// A concurrent insert of the same username surfaces as
    /// `DbError::UniqueViolation`; the identity resolver owns the retry
    /// policy for that case.
    #[instrument(skip(self, request), fields(username = %request.username), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.username)
        .fetch_one(&mut *tx)
        .await?;

        for role in &request.roles {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(UserDBResponse::from((request.roles.clone(), user)))
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        if let Some(user) = user {
            let roles = self.get_roles(user.id).await?;
            Ok(Some(UserDBResponse::from((roles, user))))
        } else {
            Ok(None)
        }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn get_roles(&mut self, id: UserId) -> Result<Vec<Role>> {
        let roles = sqlx::query_scalar::<_, Role>("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(roles)
    }

    /// Idempotent role grant
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn grant_role(&mut self, id: UserId, role: Role) -> Result<()> {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(id)
            .bind(role)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Idempotent role revocation
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn revoke_role(&mut self, id: UserId, role: Role) -> Result<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
            .bind(id)
            .bind(role)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }
}
