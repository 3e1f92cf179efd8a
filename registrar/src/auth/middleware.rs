//! Route protection middleware.
//!
//! Every request behind this middleware goes through the full authentication
//! pipeline: bearer-token extraction, token verification, identity
//! resolution, and role reconciliation. The resulting [`CurrentUser`] is
//! attached to the request for handlers to extract.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::trace;

use crate::{
    api::models::users::CurrentUser,
    auth::{
        identity::{IdentityResolver, PgUserDirectory},
        roles::set_user_roles,
    },
    errors::Error,
    AppState,
};

fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(Error::Unauthenticated { message: None })?
        .to_str()
        .map_err(|_| Error::Unauthenticated {
            message: Some("Invalid authorization header".to_string()),
        })?;

    // "JWT <token>" is accepted for parity with older identity providers.
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("JWT "))
        .ok_or(Error::Unauthenticated {
            message: Some("Expected a bearer token".to_string()),
        })
}

/// Authenticate the request and attach the resolved user.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let claims = {
        let token = bearer_token(request.headers())?;
        state.jwt.validate(token, state.config.auth.jwt.leeway)?
    };

    let directory = PgUserDirectory::new(state.db.clone());
    let resolver = IdentityResolver::new(&directory);
    let user = resolver.resolve(&claims).await?;
    let result = set_user_roles(&directory, &claims, Some(user)).await?;
    let user = result.user.ok_or_else(|| Error::Internal {
        operation: "reconcile user roles".to_string(),
    })?;

    trace!(username = %user.username, "Authenticated request");
    request.extensions_mut().insert(CurrentUser::from(user));

    Ok(next.run(request).await)
}
