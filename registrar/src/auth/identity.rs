//! Resolution of verified token claims to a persisted user.
//!
//! The resolver is deliberately generic over a [`UserDirectory`] rather than
//! reaching for a connection pool itself: the directory is the one collaborator
//! the authentication pipeline mutates, and passing it in explicitly keeps the
//! retry policy testable without a database.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, warn};

use crate::{
    api::models::users::Role,
    auth::token::Claims,
    db::{
        errors::{DbError, Result as DbResult},
        handlers::Users,
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
    errors::Error,
    types::UserId,
};

/// How many uniqueness conflicts get_or_create will absorb before giving up.
///
/// Two first-time logins for the same username can race on the insert; the
/// loser retries lookup-then-create. Anything past this bound is a genuine
/// bug signal and propagates.
pub const MAX_RETRIES: u32 = 3;

/// Storage collaborator for the authentication pipeline: user lookup/creation
/// and role membership.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user by username, creating it with the baseline role set if
    /// it does not exist. A concurrent create of the same username may
    /// surface as `DbError::UniqueViolation`.
    async fn get_or_create(&self, username: &str) -> DbResult<UserDBResponse>;

    /// Idempotent role grant.
    async fn grant_role(&self, id: UserId, role: Role) -> DbResult<()>;

    /// Idempotent role revocation.
    async fn revoke_role(&self, id: UserId, role: Role) -> DbResult<()>;
}

/// PostgreSQL-backed [`UserDirectory`].
///
/// get_or_create intentionally does a plain lookup-then-insert rather than
/// `ON CONFLICT`: the insert race must surface as a uniqueness conflict so the
/// resolver's bounded retry can repair it by re-reading.
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get_or_create(&self, username: &str) -> DbResult<UserDBResponse> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let mut users = Users::new(&mut conn);

        if let Some(user) = users.get_by_username(username).await? {
            return Ok(user);
        }

        users
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                roles: vec![Role::Learner],
            })
            .await
    }

    async fn grant_role(&self, id: UserId, role: Role) -> DbResult<()> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Users::new(&mut conn).grant_role(id, role).await
    }

    async fn revoke_role(&self, id: UserId, role: Role) -> DbResult<()> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Users::new(&mut conn).revoke_role(id, role).await
    }
}

/// Turns a verified token payload into a persisted user record.
pub struct IdentityResolver<'d, D: UserDirectory + ?Sized> {
    directory: &'d D,
}

impl<'d, D: UserDirectory + ?Sized> IdentityResolver<'d, D> {
    pub fn new(directory: &'d D) -> Self {
        Self { directory }
    }

    /// Resolve the `preferred_username` claim to a user, creating one on
    /// first sight and absorbing up to [`MAX_RETRIES`] creation races.
    #[instrument(skip_all, fields(username = claims.preferred_username.as_deref().unwrap_or("<missing>")))]
    pub async fn resolve(&self, claims: &Claims) -> Result<UserDBResponse, Error> {
        let Some(username) = claims.preferred_username.as_deref() else {
            warn!("Invalid token payload: preferred_username not present");
            return Err(Error::Unauthenticated {
                message: Some("Token is missing the preferred_username claim".to_string()),
            });
        };

        let mut conflicts = 0u32;
        loop {
            match self.directory.get_or_create(username).await {
                Ok(user) => return Ok(user),
                Err(err @ DbError::UniqueViolation { .. }) => {
                    conflicts += 1;
                    if conflicts > MAX_RETRIES {
                        return Err(err.into());
                    }
                    warn!(attempt = conflicts, "User creation raced a concurrent insert, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryDirectory;

    fn claims_for(username: Option<&str>) -> Claims {
        Claims {
            preferred_username: username.map(str::to_string),
            administrator: false,
            exp: Some(0),
            iat: Some(0),
            iss: None,
            sub: None,
            aud: None,
        }
    }

    #[tokio::test]
    async fn resolves_existing_and_new_users() {
        let directory = MemoryDirectory::new();
        let resolver = IdentityResolver::new(&directory);

        let user = resolver.resolve(&claims_for(Some("test-username"))).await.unwrap();
        assert_eq!(user.username, "test-username");
        assert_eq!(user.roles, vec![Role::Learner]);

        // idempotent on re-authentication
        let again = resolver.resolve(&claims_for(Some("test-username"))).await.unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(directory.user_count(), 1);
    }

    #[tokio::test]
    async fn missing_preferred_username_is_an_authentication_error() {
        let directory = MemoryDirectory::new();
        let resolver = IdentityResolver::new(&directory);

        let err = resolver.resolve(&claims_for(None)).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
        assert_eq!(directory.user_count(), 0);
    }

    #[tokio::test]
    async fn absorbs_conflicts_up_to_the_retry_bound() {
        for conflicts in 0..=MAX_RETRIES {
            let directory = MemoryDirectory::new().with_conflicts(conflicts);
            let resolver = IdentityResolver::new(&directory);

            let user = resolver.resolve(&claims_for(Some("test-username"))).await.unwrap();
            assert_eq!(user.username, "test-username");
        }
    }

    #[tokio::test]
    async fn propagates_conflicts_past_the_retry_bound() {
        let directory = MemoryDirectory::new().with_conflicts(MAX_RETRIES + 1);
        let resolver = IdentityResolver::new(&directory);

        let err = resolver.resolve(&claims_for(Some("test-username"))).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Database(DbError::UniqueViolation { .. })
        ));
    }
}
