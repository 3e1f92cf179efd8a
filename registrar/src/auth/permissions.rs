//! Authorization checks.

use crate::{api::models::users::CurrentUser, errors::Error};

/// Catalog writes are restricted to users holding the admin role.
pub fn require_admin(user: &CurrentUser, action: &str, resource: &str) -> Result<(), Error> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden {
            action: action.to_string(),
            resource: resource.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use uuid::Uuid;

    fn user_with_roles(roles: Vec<Role>) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "test-username".to_string(),
            roles,
        }
    }

    #[test]
    fn admins_pass() {
        let user = user_with_roles(vec![Role::Learner, Role::Admin]);
        assert!(require_admin(&user, "create", "programs").is_ok());
    }

    #[test]
    fn non_admins_are_rejected() {
        let user = user_with_roles(vec![Role::Learner]);
        let err = require_admin(&user, "create", "programs").unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
    }
}
