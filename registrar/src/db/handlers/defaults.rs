//! Database repository for the program defaults singleton.

use crate::db::{
    errors::{DbError, Result},
    models::defaults::ProgramDefaultDBResponse,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct ProgramDefault {
    #[allow(dead_code)]
    pub id: Uuid,
    pub banner_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub struct Defaults<'c> {
    db: &'c mut PgConnection,
}

impl From<ProgramDefault> for ProgramDefaultDBResponse {
    fn from(d: ProgramDefault) -> Self {
        Self {
            banner_image_url: d.banner_image_url,
            updated_at: d.updated_at,
        }
    }
}

impl<'c> Defaults<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch the single well-known defaults record. The row is seeded by the
    /// initial migration, so a missing row is a deployment fault.
    #[instrument(skip(self), err)]
    pub async fn get_default(&mut self) -> Result<ProgramDefaultDBResponse> {
        let default = sqlx::query_as::<_, ProgramDefault>("SELECT * FROM program_defaults WHERE id = $1")
            .bind(Uuid::nil())
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(ProgramDefaultDBResponse::from(default))
    }

    #[instrument(skip(self), err)]
    pub async fn set_default(&mut self, banner_image_url: Option<&str>) -> Result<ProgramDefaultDBResponse> {
        let default = sqlx::query_as::<_, ProgramDefault>(
            r#"
            UPDATE program_defaults
            SET banner_image_url = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(Uuid::nil())
        .bind(banner_image_url)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(ProgramDefaultDBResponse::from(default))
    }
}
