//! # registrar: Program Catalog Service
//!
//! `registrar` manages **programs** (curated, ordered groupings of courses
//! offered by organizations) together with the lifecycle and referential
//! rules that keep a program catalog consistent. It exposes a small
//! management API and authenticates callers with JWTs issued by an external
//! identity provider, materializing users and their role set from verified
//! token claims.
//!
//! ## Overview
//!
//! The catalog's interesting constraints are relational rules the storage
//! engine cannot express natively: a program belongs to at most one
//! organization, a course code joins a program only when its organization
//! already offers that program, curriculum positions are dense and allocated
//! in insertion order, and a course run mode's identifying tuple is unique
//! even when its optional sku is NULL. All of these are enforced in the
//! [`catalog`] write path, which runs every check inside the same transaction
//! as the write it guards and serializes writers per program with an
//! advisory lock.
//!
//! Authentication follows the same make-it-explicit philosophy: the
//! [`auth`] pipeline verifies the token (leeway-tolerant `exp`/`iat`
//! checks included), resolves `preferred_username` to a persisted user with
//! bounded retry on creation races, and reconciles the user's `admin` role
//! with the token's `administrator` claim on every request.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL (via sqlx) for all persistence. The
//! **API layer** ([`api`]) is a thin REST surface over the catalog; the
//! **database layer** ([`db`]) follows the repository pattern; migrations run
//! automatically on startup.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use registrar::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = registrar::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     registrar::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use bon::Builder;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use crate::{api::handlers, auth::middleware::jwt_auth_middleware, auth::token::JwtValidator, openapi::ApiDoc};

pub use config::Config;
pub use types::{CourseCodeId, OrganizationId, ProgramCourseCodeId, ProgramId, RunModeId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub jwt: Arc<JwtValidator>,
}

/// Get the registrar database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the application router: health endpoint, the authenticated
/// management API under `/api/v1`, and API docs at `/docs`.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> Router {
    let api_routes = Router::new()
        // Programs and their curriculum
        .route(
            "/programs",
            get(handlers::programs::list_programs).post(handlers::programs::create_program),
        )
        .route(
            "/programs/{id}",
            get(handlers::programs::get_program).patch(handlers::programs::update_program),
        )
        .route(
            "/programs/{id}/organizations",
            axum::routing::post(handlers::programs::associate_organization),
        )
        .route(
            "/programs/{id}/course-codes",
            get(handlers::programs::list_program_course_codes).post(handlers::programs::attach_course_code),
        )
        // Organizations and their course codes
        .route(
            "/organizations",
            get(handlers::organizations::list_organizations).post(handlers::organizations::create_organization),
        )
        .route("/organizations/{id}", get(handlers::organizations::get_organization))
        .route(
            "/organizations/{id}/course-codes",
            get(handlers::organizations::list_course_codes).post(handlers::organizations::create_course_code),
        )
        // Run modes
        .route(
            "/course-codes/{program_course_code_id}/run-modes",
            get(handlers::run_modes::list_run_modes).post(handlers::run_modes::create_run_mode),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .with_state(state.clone());

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/docs"))
        // The management API is deployed same-origin; permissive CORS keeps
        // local tooling working without a config knob.
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and builds the router.
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPool::connect(&config.database.url).await?;
        migrator().run(&pool).await?;

        let jwt = Arc::new(JwtValidator::new(&config.auth.jwt)?);

        let state = AppState::builder().db(pool.clone()).config(config.clone()).jwt(jwt).build();
        let router = build_router(&state);

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("registrar listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        api::models::users::Role,
        db::handlers::Users,
        test_utils::{create_test_organization, mint_user_token, test_config},
    };
    use serde_json::json;

    fn create_test_app(pool: PgPool) -> axum_test::TestServer {
        let config = test_config();
        let jwt = Arc::new(JwtValidator::new(&config.auth.jwt).unwrap());
        let state = AppState::builder().db(pool).config(config).jwt(jwt).build();
        axum_test::TestServer::new(build_router(&state)).expect("Failed to create test server")
    }

    #[sqlx::test]
    #[test_log::test]
    async fn requests_without_a_token_are_rejected(pool: PgPool) {
        let server = create_test_app(pool);

        let response = server.get("/api/v1/programs").await;
        assert_eq!(response.status_code().as_u16(), 401);

        // health endpoint stays open
        let response = server.get("/healthz").await;
        assert_eq!(response.status_code().as_u16(), 200);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn first_authentication_creates_the_user_with_synced_roles(pool: PgPool) {
        let server = create_test_app(pool.clone());

        let response = server
            .get("/api/v1/programs")
            .add_header("authorization", format!("Bearer {}", mint_user_token("new-admin", true)))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn)
            .get_by_username("new-admin")
            .await
            .unwrap()
            .expect("user should have been created on first authentication");
        assert!(user.roles.contains(&Role::Admin));
        assert!(user.roles.contains(&Role::Learner));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn admin_role_follows_the_administrator_claim(pool: PgPool) {
        let server = create_test_app(pool.clone());

        // promoted on an administrator token...
        server
            .get("/api/v1/programs")
            .add_header("authorization", format!("Bearer {}", mint_user_token("alex", true)))
            .await
            .assert_status_ok();

        // ...and demoted again once the claim is gone
        server
            .get("/api/v1/programs")
            .add_header("authorization", format!("Bearer {}", mint_user_token("alex", false)))
            .await
            .assert_status_ok();

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_by_username("alex").await.unwrap().unwrap();
        assert!(!user.roles.contains(&Role::Admin));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn catalog_writes_require_the_admin_role(pool: PgPool) {
        let server = create_test_app(pool);

        let body = json!({
            "name": "Test Program",
            "category": "MicroMasters",
        });

        let response = server
            .post("/api/v1/programs")
            .add_header("authorization", format!("Bearer {}", mint_user_token("learner", false)))
            .json(&body)
            .await;
        assert_eq!(response.status_code().as_u16(), 403);

        let response = server
            .post("/api/v1/programs")
            .add_header("authorization", format!("Bearer {}", mint_user_token("admin", true)))
            .json(&body)
            .await;
        assert_eq!(response.status_code().as_u16(), 201);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn catalog_flow_end_to_end(pool: PgPool) {
        let server = create_test_app(pool.clone());
        let token = mint_user_token("admin", true);
        let org = create_test_organization(&pool).await;

        let program: serde_json::Value = server
            .post("/api/v1/programs")
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "Data Science", "category": "MicroMasters"}))
            .await
            .json();

        server
            .post(&format!("/api/v1/programs/{}/organizations", program["id"].as_str().unwrap()))
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"organization_id": org.id}))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let code: serde_json::Value = server
            .post(&format!("/api/v1/organizations/{}/course-codes", org.id))
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"key": "DS101", "display_name": "Intro to Data Science"}))
            .await
            .json();

        let link: serde_json::Value = server
            .post(&format!("/api/v1/programs/{}/course-codes", program["id"].as_str().unwrap()))
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"course_code_id": code["id"]}))
            .await
            .json();
        assert_eq!(link["position"], 1);

        let run_mode: serde_json::Value = server
            .post(&format!("/api/v1/course-codes/{}/run-modes", link["id"].as_str().unwrap()))
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"course_key": "course-v1:edX+DS101+2016", "mode_slug": "verified"}))
            .await
            .json();
        assert_eq!(run_mode["run_key"], "2016");

        // duplicate NULL-sku run mode is rejected with a validation error
        let response = server
            .post(&format!("/api/v1/course-codes/{}/run-modes", link["id"].as_str().unwrap()))
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"course_key": "course-v1:edX+DS101+2016", "mode_slug": "verified"}))
            .await;
        assert_eq!(response.status_code().as_u16(), 400);
    }
}
