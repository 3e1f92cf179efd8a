//! OpenAPI document assembly.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::{handlers, models};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "registrar",
        description = "Program catalog service: curated course groupings with lifecycle states and JWT-synced roles"
    ),
    paths(
        handlers::programs::list_programs,
        handlers::programs::create_program,
        handlers::programs::get_program,
        handlers::programs::update_program,
        handlers::programs::associate_organization,
        handlers::programs::list_program_course_codes,
        handlers::programs::attach_course_code,
        handlers::organizations::list_organizations,
        handlers::organizations::create_organization,
        handlers::organizations::get_organization,
        handlers::organizations::list_course_codes,
        handlers::organizations::create_course_code,
        handlers::run_modes::list_run_modes,
        handlers::run_modes::create_run_mode,
    ),
    components(schemas(
        models::programs::ProgramCategory,
        models::programs::ProgramStatus,
        models::programs::ProgramCreate,
        models::programs::ProgramUpdate,
        models::programs::ProgramResponse,
        models::programs::ProgramOrganizationCreate,
        models::organizations::OrganizationCreate,
        models::organizations::OrganizationResponse,
        models::organizations::ProgramOrganizationResponse,
        models::course_codes::CourseCodeCreate,
        models::course_codes::CourseCodeResponse,
        models::course_codes::ProgramCourseCodeCreate,
        models::course_codes::ProgramCourseCodeResponse,
        models::run_modes::RunModeCreate,
        models::run_modes::RunModeResponse,
        models::users::Role,
        models::users::UserResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "programs", description = "Program lifecycle and curriculum"),
        (name = "organizations", description = "Organizations and their course codes"),
        (name = "run-modes", description = "Course run modes"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
