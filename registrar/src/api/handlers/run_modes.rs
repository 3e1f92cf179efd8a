//! Handlers for course run modes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        run_modes::{RunModeCreate, RunModeResponse},
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    catalog::Catalog,
    db::{errors::DbError, handlers::RunModes},
    errors::Result,
    types::ProgramCourseCodeId,
};

#[utoipa::path(
    get,
    path = "/course-codes/{program_course_code_id}/run-modes",
    tag = "run-modes",
    summary = "List run modes under a program course code",
    params(("program_course_code_id" = String, Path, description = "Program course code ID")),
    responses(
        (status = 200, description = "Run modes", body = Vec<RunModeResponse>)
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_run_modes(
    State(state): State<crate::AppState>,
    Path(program_course_code_id): Path<ProgramCourseCodeId>,
    _user: CurrentUser,
) -> Result<Json<Vec<RunModeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let run_modes = RunModes::new(&mut conn)
        .list_for_program_course_code(program_course_code_id)
        .await?;

    Ok(Json(run_modes.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/course-codes/{program_course_code_id}/run-modes",
    tag = "run-modes",
    summary = "Add a run mode under a program course code",
    params(("program_course_code_id" = String, Path, description = "Program course code ID")),
    request_body = RunModeCreate,
    responses(
        (status = 201, description = "Run mode created", body = RunModeResponse),
        (status = 400, description = "Duplicate run mode or invalid course key"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_run_mode(
    State(state): State<crate::AppState>,
    Path(program_course_code_id): Path<ProgramCourseCodeId>,
    user: CurrentUser,
    Json(request): Json<RunModeCreate>,
) -> Result<(StatusCode, Json<RunModeResponse>)> {
    require_admin(&user, "create", "run modes")?;

    let run_mode = Catalog::new(state.db.clone())
        .add_run_mode(request.into_db_request(program_course_code_id))
        .await?;

    Ok((StatusCode::CREATED, Json(run_mode.into())))
}
