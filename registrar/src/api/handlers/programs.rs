//! Handlers for programs and their curriculum.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        course_codes::{ProgramCourseCodeCreate, ProgramCourseCodeResponse},
        organizations::ProgramOrganizationResponse,
        programs::{
            ListProgramsQuery, ProgramCreate, ProgramOrganizationCreate, ProgramResponse,
            ProgramUpdate,
        },
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    catalog::Catalog,
    db::handlers::{CourseCodes, Programs, Repository},
    db::{errors::DbError, handlers::programs::ProgramFilter},
    errors::{Error, Result},
    types::ProgramId,
};

#[utoipa::path(
    get,
    path = "/programs",
    tag = "programs",
    summary = "List programs",
    params(ListProgramsQuery),
    responses(
        (status = 200, description = "List of programs", body = Vec<ProgramResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_programs(
    State(state): State<crate::AppState>,
    Query(query): Query<ListProgramsQuery>,
    _user: CurrentUser,
) -> Result<Json<Vec<ProgramResponse>>> {
    let mut filter = ProgramFilter::new(query.skip.unwrap_or(0), query.limit.unwrap_or(100).min(1000));
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }
    if let Some(category) = query.category {
        filter = filter.with_category(category);
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let programs = Programs::new(&mut conn).list(&filter).await?;
    drop(conn);

    let default_banner = Catalog::new(state.db.clone()).default_banner().await?;
    let programs = programs
        .into_iter()
        .map(|p| ProgramResponse::with_default_banner(p, default_banner.clone()))
        .collect();

    Ok(Json(programs))
}

#[utoipa::path(
    post,
    path = "/programs",
    tag = "programs",
    summary = "Create a program",
    request_body = ProgramCreate,
    responses(
        (status = 201, description = "Program created", body = ProgramResponse),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Program name already exists")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_program(
    State(state): State<crate::AppState>,
    user: CurrentUser,
    Json(request): Json<ProgramCreate>,
) -> Result<(StatusCode, Json<ProgramResponse>)> {
    require_admin(&user, "create", "programs")?;

    let catalog = Catalog::new(state.db.clone());
    let program = catalog.create_program(request.into()).await?;
    let default_banner = catalog.default_banner().await?;

    Ok((
        StatusCode::CREATED,
        Json(ProgramResponse::with_default_banner(program, default_banner)),
    ))
}

#[utoipa::path(
    get,
    path = "/programs/{id}",
    tag = "programs",
    summary = "Get a program",
    params(("id" = String, Path, description = "Program ID")),
    responses(
        (status = 200, description = "The program", body = ProgramResponse),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_program(
    State(state): State<crate::AppState>,
    Path(id): Path<ProgramId>,
    _user: CurrentUser,
) -> Result<Json<ProgramResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let program = Programs::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Program".to_string(),
            id: id.to_string(),
        })?;
    drop(conn);

    let default_banner = Catalog::new(state.db.clone()).default_banner().await?;
    Ok(Json(ProgramResponse::with_default_banner(program, default_banner)))
}

#[utoipa::path(
    patch,
    path = "/programs/{id}",
    tag = "programs",
    summary = "Update a program",
    params(("id" = String, Path, description = "Program ID")),
    request_body = ProgramUpdate,
    responses(
        (status = 200, description = "Updated program", body = ProgramResponse),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_program(
    State(state): State<crate::AppState>,
    Path(id): Path<ProgramId>,
    user: CurrentUser,
    Json(request): Json<ProgramUpdate>,
) -> Result<Json<ProgramResponse>> {
    require_admin(&user, "update", "programs")?;

    let catalog = Catalog::new(state.db.clone());
    let program = catalog.update_program(id, request.into()).await?;
    let default_banner = catalog.default_banner().await?;

    Ok(Json(ProgramResponse::with_default_banner(program, default_banner)))
}

#[utoipa::path(
    post,
    path = "/programs/{id}/organizations",
    tag = "programs",
    summary = "Associate an organization with a program",
    params(("id" = String, Path, description = "Program ID")),
    request_body = ProgramOrganizationCreate,
    responses(
        (status = 201, description = "Association created", body = ProgramOrganizationResponse),
        (status = 400, description = "Program already has an organization"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn associate_organization(
    State(state): State<crate::AppState>,
    Path(id): Path<ProgramId>,
    user: CurrentUser,
    Json(request): Json<ProgramOrganizationCreate>,
) -> Result<(StatusCode, Json<ProgramOrganizationResponse>)> {
    require_admin(&user, "update", "programs")?;

    let link = Catalog::new(state.db.clone())
        .associate_organization(id, request.organization_id)
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

#[utoipa::path(
    get,
    path = "/programs/{id}/course-codes",
    tag = "programs",
    summary = "List a program's curriculum in position order",
    params(("id" = String, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Curriculum links", body = Vec<ProgramCourseCodeResponse>)
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_program_course_codes(
    State(state): State<crate::AppState>,
    Path(id): Path<ProgramId>,
    _user: CurrentUser,
) -> Result<Json<Vec<ProgramCourseCodeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let links = CourseCodes::new(&mut conn).list_for_program(id).await?;

    Ok(Json(links.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/programs/{id}/course-codes",
    tag = "programs",
    summary = "Attach a course code to a program",
    params(("id" = String, Path, description = "Program ID")),
    request_body = ProgramCourseCodeCreate,
    responses(
        (status = 201, description = "Curriculum link created", body = ProgramCourseCodeResponse),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn attach_course_code(
    State(state): State<crate::AppState>,
    Path(id): Path<ProgramId>,
    user: CurrentUser,
    Json(request): Json<ProgramCourseCodeCreate>,
) -> Result<(StatusCode, Json<ProgramCourseCodeResponse>)> {
    require_admin(&user, "update", "programs")?;

    let link = Catalog::new(state.db.clone())
        .attach_course_code(id, request.course_code_id, request.position)
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}
