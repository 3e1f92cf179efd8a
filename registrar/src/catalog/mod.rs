//! Catalog write path.
//!
//! All mutations of the program catalog funnel through [`Catalog`]: one
//! transaction per operation, with every invariant checked inside that
//! transaction immediately before the write it guards. Keeping the checks in
//! explicit validate-then-write functions (rather than buried in storage
//! hooks) makes the write path the single place where catalog consistency is
//! decided.
//!
//! Concurrent writers are serialized per program with a transaction-scoped
//! advisory lock, so two requests allocating the next curriculum position (or
//! racing an association check) cannot both pass their reads before either
//! commits. User creation is the one race handled differently; see
//! [`crate::auth::identity`].

pub mod rules;

use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use crate::{
    db::{
        errors::DbError,
        handlers::{CourseCodes, Defaults, Organizations, Programs, Repository, RunModes},
        models::{
            course_codes::ProgramCourseCodeDBResponse,
            organizations::ProgramOrganizationDBResponse,
            programs::{ProgramCreateDBRequest, ProgramDBResponse, ProgramUpdateDBRequest},
            run_modes::{RunModeCreateDBRequest, RunModeDBResponse},
        },
    },
    errors::{Error, Result},
    types::{abbrev_uuid, CourseCodeId, CourseKey, OrganizationId, ProgramId},
};

/// The single write-path orchestrator for the program catalog.
#[derive(Clone)]
pub struct Catalog {
    db: PgPool,
}

/// Serialize catalog writers touching the same program.
///
/// The lock is transaction-scoped: it releases on commit or rollback, so no
/// explicit unlock is needed and an aborted operation cannot strand it.
async fn lock_program(conn: &mut PgConnection, program_id: ProgramId) -> Result<()> {
    let b = program_id.as_bytes();
    let key = i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(key)
        .execute(conn)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

impl Catalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a program. Rejects an active XSeries program without a
    /// marketing slug.
    #[instrument(skip(self, request), fields(name = %request.name), err)]
    pub async fn create_program(&self, request: ProgramCreateDBRequest) -> Result<ProgramDBResponse> {
        rules::check_active_xseries_has_slug(request.category, request.status, request.marketing_slug.as_deref())?;

        let mut tx = self.db.begin().await.map_err(DbError::from)?;
        let program = Programs::new(&mut tx).create(&request).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(program)
    }

    /// Update a program. The slug rule is checked against the state the row
    /// will have after the update.
    #[instrument(skip(self, request), fields(program_id = %abbrev_uuid(&program_id)), err)]
    pub async fn update_program(
        &self,
        program_id: ProgramId,
        request: ProgramUpdateDBRequest,
    ) -> Result<ProgramDBResponse> {
        let mut tx = self.db.begin().await.map_err(DbError::from)?;
        lock_program(&mut tx, program_id).await?;

        let existing = Programs::new(&mut tx)
            .get_by_id(program_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Program".to_string(),
                id: program_id.to_string(),
            })?;

        // Effective post-update state under COALESCE semantics.
        let status = request.status.unwrap_or(existing.status);
        let marketing_slug = request.marketing_slug.as_deref().or(existing.marketing_slug.as_deref());
        rules::check_active_xseries_has_slug(existing.category, status, marketing_slug)?;

        let program = Programs::new(&mut tx).update(program_id, &request).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(program)
    }

    /// Associate an organization with a program. A program can be offered by
    /// at most one organization; the storage engine cannot express that, so
    /// it is checked here before the insert.
    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&program_id)), err)]
    pub async fn associate_organization(
        &self,
        program_id: ProgramId,
        organization_id: OrganizationId,
    ) -> Result<ProgramOrganizationDBResponse> {
        let mut tx = self.db.begin().await.map_err(DbError::from)?;
        lock_program(&mut tx, program_id).await?;

        Programs::new(&mut tx)
            .get_by_id(program_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Program".to_string(),
                id: program_id.to_string(),
            })?;
        Organizations::new(&mut tx)
            .get_by_id(organization_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Organization".to_string(),
                id: organization_id.to_string(),
            })?;

        if Organizations::new(&mut tx).program_association(program_id).await?.is_some() {
            return Err(Error::Validation {
                message: "Cannot associate multiple organizations with a program.".to_string(),
            });
        }

        let link = Organizations::new(&mut tx)
            .associate_program(program_id, organization_id)
            .await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(link)
    }

    /// Attach a course code to a program's curriculum.
    ///
    /// When no position is supplied, the course code must be new to every
    /// program, its organization must already offer the program, and the
    /// position is allocated as one past the program's historical maximum.
    /// An explicit position skips allocation and relies on the
    /// (program, position) unique constraint.
    #[instrument(skip(self), fields(program_id = %abbrev_uuid(&program_id)), err)]
    pub async fn attach_course_code(
        &self,
        program_id: ProgramId,
        course_code_id: CourseCodeId,
        position: Option<i32>,
    ) -> Result<ProgramCourseCodeDBResponse> {
        let mut tx = self.db.begin().await.map_err(DbError::from)?;
        lock_program(&mut tx, program_id).await?;

        let course_code = CourseCodes::new(&mut tx)
            .get_by_id(course_code_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "CourseCode".to_string(),
                id: course_code_id.to_string(),
            })?;

        let position = match position {
            Some(position) => position,
            None => {
                if CourseCodes::new(&mut tx).in_any_program(course_code_id).await? {
                    return Err(Error::Validation {
                        message: "Cannot associate multiple programs with a course code.".to_string(),
                    });
                }
                if !Organizations::new(&mut tx)
                    .is_program_organization(program_id, course_code.organization_id)
                    .await?
                {
                    return Err(Error::Validation {
                        message: "Course code must be offered by the same organization offering the program."
                            .to_string(),
                    });
                }
                let max = CourseCodes::new(&mut tx).max_position(program_id).await?;
                rules::next_position(max)
            }
        };

        let link = CourseCodes::new(&mut tx)
            .attach_to_program(program_id, course_code_id, position)
            .await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(link)
    }

    /// Add a run mode under a program course code.
    ///
    /// The run-mode tuple must be unique with NULL skus treated as equal, a
    /// case the table's unique constraint silently admits; the course key
    /// must parse, and its run segment is persisted as `run_key`.
    #[instrument(skip(self, request), fields(course_key = %request.course_key), err)]
    pub async fn add_run_mode(&self, request: RunModeCreateDBRequest) -> Result<RunModeDBResponse> {
        let mut tx = self.db.begin().await.map_err(DbError::from)?;

        let link = CourseCodes::new(&mut tx)
            .get_program_course_code(request.program_course_code_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "ProgramCourseCode".to_string(),
                id: request.program_course_code_id.to_string(),
            })?;
        lock_program(&mut tx, link.program_id).await?;

        if RunModes::new(&mut tx)
            .duplicate_exists(
                request.program_course_code_id,
                &request.course_key,
                &request.mode_slug,
                request.sku.as_deref(),
            )
            .await?
        {
            return Err(Error::Validation {
                message: "Duplicate course run modes are not allowed for course codes in a program.".to_string(),
            });
        }

        let course_key: CourseKey = request.course_key.parse().map_err(|e: crate::types::CourseKeyError| {
            Error::Validation { message: e.to_string() }
        })?;

        let run_mode = RunModes::new(&mut tx).create(&request, &course_key.run).await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(run_mode)
    }

    /// The catalog-wide fallback banner, from the defaults singleton.
    #[instrument(skip(self), err)]
    pub async fn default_banner(&self) -> Result<Option<String>> {
        let mut conn = self.db.acquire().await.map_err(DbError::from)?;
        let default = Defaults::new(&mut conn).get_default().await?;
        Ok(default.banner_image_url)
    }

    #[instrument(skip(self), err)]
    pub async fn set_default_banner(&self, banner_image_url: Option<&str>) -> Result<Option<String>> {
        let mut conn = self.db.acquire().await.map_err(DbError::from)?;
        let default = Defaults::new(&mut conn).set_default(banner_image_url).await?;
        Ok(default.banner_image_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::programs::{ProgramCategory, ProgramStatus},
        test_utils::{attach_course_code, create_test_course_code, create_test_organization, create_test_program},
    };

    fn program_request(name: &str, category: ProgramCategory, status: ProgramStatus) -> ProgramCreateDBRequest {
        ProgramCreateDBRequest {
            name: name.to_string(),
            subtitle: None,
            category,
            status,
            marketing_slug: None,
            banner_image_url: None,
        }
    }

    fn run_mode_request(
        program_course_code_id: crate::types::ProgramCourseCodeId,
        course_key: &str,
        mode_slug: &str,
        sku: Option<&str>,
    ) -> RunModeCreateDBRequest {
        RunModeCreateDBRequest {
            program_course_code_id,
            lms_url: None,
            course_key: course_key.to_string(),
            mode_slug: mode_slug.to_string(),
            sku: sku.map(str::to_string),
            start_date: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn active_xseries_program_requires_marketing_slug(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool);

        let err = catalog
            .create_program(program_request("XSeries Demo", ProgramCategory::XSeries, ProgramStatus::Active))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let mut request = program_request("XSeries Demo", ProgramCategory::XSeries, ProgramStatus::Active);
        request.marketing_slug = Some("xseries-demo".to_string());
        let program = catalog.create_program(request).await.unwrap();
        assert_eq!(program.status, ProgramStatus::Active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn activating_an_xseries_program_checks_the_post_update_state(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool);
        let program = catalog
            .create_program(program_request("XSeries Demo", ProgramCategory::XSeries, ProgramStatus::Unpublished))
            .await
            .unwrap();

        // activating without ever setting a slug fails
        let err = catalog
            .update_program(
                program.id,
                ProgramUpdateDBRequest {
                    status: Some(ProgramStatus::Active),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // supplying the slug in the same update succeeds
        let updated = catalog
            .update_program(
                program.id,
                ProgramUpdateDBRequest {
                    status: Some(ProgramStatus::Active),
                    marketing_slug: Some("xseries-demo".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ProgramStatus::Active);
        assert_eq!(updated.marketing_slug.as_deref(), Some("xseries-demo"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn a_program_joins_at_most_one_organization(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool.clone());
        let program = create_test_program(&pool).await;
        let org_a = create_test_organization(&pool).await;
        let org_b = create_test_organization(&pool).await;

        catalog.associate_organization(program.id, org_a.id).await.unwrap();

        let err = catalog.associate_organization(program.id, org_b.id).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // re-associating the same organization is also rejected
        let err = catalog.associate_organization(program.id, org_a.id).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn course_codes_get_dense_positions_in_insertion_order(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool.clone());
        let program = create_test_program(&pool).await;
        let org = create_test_organization(&pool).await;
        catalog.associate_organization(program.id, org.id).await.unwrap();

        for expected in 1..=3 {
            let code = create_test_course_code(&pool, org.id).await;
            let link = catalog.attach_course_code(program.id, code.id, None).await.unwrap();
            assert_eq!(link.position, expected);
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn course_code_must_share_the_programs_organization(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool.clone());
        let program = create_test_program(&pool).await;
        let org = create_test_organization(&pool).await;
        let other_org = create_test_organization(&pool).await;
        catalog.associate_organization(program.id, org.id).await.unwrap();

        let foreign_code = create_test_course_code(&pool, other_org.id).await;
        let err = catalog.attach_course_code(program.id, foreign_code.id, None).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // and a program with no organization at all cannot take course codes
        let orphan_program = create_test_program(&pool).await;
        let code = create_test_course_code(&pool, org.id).await;
        let err = catalog.attach_course_code(orphan_program.id, code.id, None).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn course_code_joins_at_most_one_program(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool.clone());
        let org = create_test_organization(&pool).await;
        let program_a = create_test_program(&pool).await;
        let program_b = create_test_program(&pool).await;
        catalog.associate_organization(program_a.id, org.id).await.unwrap();
        catalog.associate_organization(program_b.id, org.id).await.unwrap();

        let code = create_test_course_code(&pool, org.id).await;
        catalog.attach_course_code(program_a.id, code.id, None).await.unwrap();

        let err = catalog.attach_course_code(program_b.id, code.id, None).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn null_skus_share_one_equivalence_class(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool.clone());
        let link = attach_course_code(&pool, &catalog).await;
        let course_key = "course-v1:edX+DemoX+Demo_2014";

        catalog
            .add_run_mode(run_mode_request(link.id, course_key, "verified", None))
            .await
            .unwrap();

        // second row with the same tuple and a NULL sku is rejected
        let err = catalog
            .add_run_mode(run_mode_request(link.id, course_key, "verified", None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // a distinct sku makes the tuple unique again
        catalog
            .add_run_mode(run_mode_request(link.id, course_key, "verified", Some("SKU-1")))
            .await
            .unwrap();

        // but duplicating a concrete sku is rejected too
        let err = catalog
            .add_run_mode(run_mode_request(link.id, course_key, "verified", Some("SKU-1")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // a different mode under the same course key is fine
        catalog
            .add_run_mode(run_mode_request(link.id, course_key, "audit", None))
            .await
            .unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn run_key_is_derived_from_the_course_key(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool.clone());
        let link = attach_course_code(&pool, &catalog).await;

        let run_mode = catalog
            .add_run_mode(run_mode_request(link.id, "course-v1:edX+DemoX+Demo_2014", "verified", None))
            .await
            .unwrap();
        assert_eq!(run_mode.run_key, "Demo_2014");

        let legacy = catalog
            .add_run_mode(run_mode_request(link.id, "edX/DemoX/Demo_2015", "verified", None))
            .await
            .unwrap();
        assert_eq!(legacy.run_key, "Demo_2015");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn unparsable_course_keys_are_rejected(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool.clone());
        let link = attach_course_code(&pool, &catalog).await;

        let err = catalog
            .add_run_mode(run_mode_request(link.id, "not-a-course-key", "verified", None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // nothing was written
        let mut conn = pool.acquire().await.unwrap();
        let rows = RunModes::new(&mut conn).list_for_program_course_code(link.id).await.unwrap();
        assert!(rows.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn default_banner_round_trips(pool: sqlx::PgPool) {
        let catalog = Catalog::new(pool);

        // the singleton row is seeded empty by the migration
        assert_eq!(catalog.default_banner().await.unwrap(), None);

        catalog.set_default_banner(Some("https://cdn.example.com/default-banner.jpg")).await.unwrap();
        assert_eq!(
            catalog.default_banner().await.unwrap().as_deref(),
            Some("https://cdn.example.com/default-banner.jpg")
        );
    }
}
