//! Role reconciliation from token claims.
//!
//! This is the role-assignment step of the authentication pipeline: after the
//! identity resolver produces a user, the user's `admin` role membership is
//! brought in line with the token's `administrator` claim. The step's output
//! shape (`{"user": …}` or `{}`) is part of the pipeline contract consumed by
//! the surrounding auth flow and must stay stable.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    api::models::users::Role,
    auth::{identity::UserDirectory, token::Claims},
    db::models::users::UserDBResponse,
    errors::Result,
};

/// Output of the role-assignment pipeline step.
///
/// Serializes to `{"user": …}` when a user was processed and to `{}` when
/// none was supplied.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct PipelineResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDBResponse>,
}

/// Reconcile the user's `admin` role with the `administrator` claim.
///
/// With no user (authentication did not complete or the user was dropped
/// earlier in the pipeline) this is a no-op and must not fail.
#[instrument(skip_all, fields(administrator = claims.administrator))]
pub async fn set_user_roles<D>(
    directory: &D,
    claims: &Claims,
    user: Option<UserDBResponse>,
) -> Result<PipelineResult>
where
    D: UserDirectory + ?Sized,
{
    let Some(mut user) = user else {
        return Ok(PipelineResult::default());
    };

    if claims.administrator {
        directory.grant_role(user.id, Role::Admin).await?;
        if !user.roles.contains(&Role::Admin) {
            user.roles.push(Role::Admin);
        }
        debug!(username = %user.username, "Granted admin role");
    } else {
        directory.revoke_role(user.id, Role::Admin).await?;
        user.roles.retain(|role| *role != Role::Admin);
    }

    Ok(PipelineResult { user: Some(user) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryDirectory;

    fn claims_with_admin(administrator: bool) -> Claims {
        Claims {
            preferred_username: Some("test-username".to_string()),
            administrator,
            exp: Some(0),
            iat: Some(0),
            iss: None,
            sub: None,
            aud: None,
        }
    }

    async fn seeded_user(directory: &MemoryDirectory) -> UserDBResponse {
        directory.get_or_create("test-username").await.unwrap()
    }

    #[tokio::test]
    async fn administrator_claim_grants_the_admin_role() {
        let directory = MemoryDirectory::new();
        let user = seeded_user(&directory).await;
        assert!(!directory.has_role(user.id, Role::Admin));

        let result = set_user_roles(&directory, &claims_with_admin(true), Some(user.clone()))
            .await
            .unwrap();

        assert!(directory.has_role(user.id, Role::Admin));
        let returned = result.user.unwrap();
        assert_eq!(returned.id, user.id);
        assert!(returned.roles.contains(&Role::Admin));
    }

    #[tokio::test]
    async fn false_or_absent_claim_revokes_the_admin_role() {
        let directory = MemoryDirectory::new();
        let user = seeded_user(&directory).await;
        directory.grant_role(user.id, Role::Admin).await.unwrap();

        let result = set_user_roles(&directory, &claims_with_admin(false), Some(user.clone()))
            .await
            .unwrap();

        assert!(!directory.has_role(user.id, Role::Admin));
        assert!(!result.user.unwrap().roles.contains(&Role::Admin));
    }

    #[tokio::test]
    async fn grant_and_revoke_are_idempotent() {
        let directory = MemoryDirectory::new();
        let user = seeded_user(&directory).await;

        for _ in 0..2 {
            set_user_roles(&directory, &claims_with_admin(true), Some(user.clone()))
                .await
                .unwrap();
        }
        assert_eq!(directory.roles_of(user.id), vec![Role::Learner, Role::Admin]);

        for _ in 0..2 {
            set_user_roles(&directory, &claims_with_admin(false), Some(user.clone()))
                .await
                .unwrap();
        }
        assert_eq!(directory.roles_of(user.id), vec![Role::Learner]);
    }

    #[tokio::test]
    async fn no_user_is_a_no_op() {
        let directory = MemoryDirectory::new();

        let result = set_user_roles(&directory, &claims_with_admin(true), None).await.unwrap();

        assert_eq!(result, PipelineResult::default());
        assert_eq!(directory.user_count(), 0);
        // pipeline contract: serializes to an empty mapping
        assert_eq!(serde_json::to_value(&result).unwrap(), serde_json::json!({}));
    }

    #[tokio::test]
    async fn processed_user_serializes_under_the_user_key() {
        let directory = MemoryDirectory::new();
        let user = seeded_user(&directory).await;

        let result = set_user_roles(&directory, &claims_with_admin(false), Some(user.clone()))
            .await
            .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["user"]["username"], "test-username");
    }
}
