//! Handlers for organizations and their course codes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        course_codes::{CourseCodeCreate, CourseCodeResponse},
        organizations::{ListOrganizationsQuery, OrganizationCreate, OrganizationResponse},
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    db::{
        errors::DbError,
        handlers::{course_codes::CourseCodeFilter, organizations::OrganizationFilter, CourseCodes, Organizations, Repository},
    },
    errors::{Error, Result},
    types::OrganizationId,
};

#[utoipa::path(
    get,
    path = "/organizations",
    tag = "organizations",
    summary = "List organizations",
    params(ListOrganizationsQuery),
    responses(
        (status = 200, description = "List of organizations", body = Vec<OrganizationResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_organizations(
    State(state): State<crate::AppState>,
    Query(query): Query<ListOrganizationsQuery>,
    _user: CurrentUser,
) -> Result<Json<Vec<OrganizationResponse>>> {
    let filter = OrganizationFilter::new(query.skip.unwrap_or(0), query.limit.unwrap_or(100).min(1000));

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let orgs = Organizations::new(&mut conn).list(&filter).await?;

    Ok(Json(orgs.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/organizations",
    tag = "organizations",
    summary = "Create an organization",
    request_body = OrganizationCreate,
    responses(
        (status = 201, description = "Organization created", body = OrganizationResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Key or display name already exists")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_organization(
    State(state): State<crate::AppState>,
    user: CurrentUser,
    Json(request): Json<OrganizationCreate>,
) -> Result<(StatusCode, Json<OrganizationResponse>)> {
    require_admin(&user, "create", "organizations")?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let org = Organizations::new(&mut conn).create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(org.into())))
}

#[utoipa::path(
    get,
    path = "/organizations/{id}",
    tag = "organizations",
    summary = "Get an organization",
    params(("id" = String, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "The organization", body = OrganizationResponse),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_organization(
    State(state): State<crate::AppState>,
    Path(id): Path<OrganizationId>,
    _user: CurrentUser,
) -> Result<Json<OrganizationResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let org = Organizations::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Organization".to_string(),
            id: id.to_string(),
        })?;

    Ok(Json(org.into()))
}

#[utoipa::path(
    get,
    path = "/organizations/{id}/course-codes",
    tag = "organizations",
    summary = "List an organization's course codes",
    params(("id" = String, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Course codes", body = Vec<CourseCodeResponse>)
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_course_codes(
    State(state): State<crate::AppState>,
    Path(id): Path<OrganizationId>,
    _user: CurrentUser,
) -> Result<Json<Vec<CourseCodeResponse>>> {
    let filter = CourseCodeFilter::new(0, 1000).for_organization(id);

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let codes = CourseCodes::new(&mut conn).list(&filter).await?;

    Ok(Json(codes.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/organizations/{id}/course-codes",
    tag = "organizations",
    summary = "Create a course code under an organization",
    params(("id" = String, Path, description = "Organization ID")),
    request_body = CourseCodeCreate,
    responses(
        (status = 201, description = "Course code created", body = CourseCodeResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Key already exists for this organization")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_course_code(
    State(state): State<crate::AppState>,
    Path(id): Path<OrganizationId>,
    user: CurrentUser,
    Json(request): Json<CourseCodeCreate>,
) -> Result<(StatusCode, Json<CourseCodeResponse>)> {
    require_admin(&user, "create", "course codes")?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    Organizations::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Organization".to_string(),
            id: id.to_string(),
        })?;

    let code = CourseCodes::new(&mut conn).create(&request.into_db_request(id)).await?;

    Ok((StatusCode::CREATED, Json(code.into())))
}
