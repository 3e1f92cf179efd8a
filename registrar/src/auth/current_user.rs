//! Extractor for the authenticated user in handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{api::models::users::CurrentUser, errors::Error};

/// Pulls the [`CurrentUser`] the auth middleware attached to the request.
/// Routes that are not behind the middleware reject with 401.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(Error::Unauthenticated { message: None })
    }
}
