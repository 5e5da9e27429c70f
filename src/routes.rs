// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, projects, resume},
    state::AppState,
    utils::guard::route_guard,
};

/// Assembles the main application router.
///
/// * Credential entry points sit at the top level so the route guard's
///   signed-in redirect applies to them directly.
/// * Admin routes live under /admin; the guard redirects anyone without the
///   admin role to login with a callback.
/// * Applies global middleware (Route Guard, Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Brute-force protection on the credential entry points, keyed by peer
    // IP (the server must be built with connect-info, see main.rs).
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(20)
            .finish()
            .unwrap(),
    );

    let credential_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(GovernorLayer::new(governor_conf));

    let auth_routes = Router::new()
        .route("/session", get(auth::session))
        .route("/check-email", post(auth::check_email));

    let project_routes = Router::new()
        .route("/", get(projects::list_projects))
        .route("/{slug}", get(projects::get_project));

    let resume_routes = Router::new()
        .route("/profile", get(resume::get_profile))
        .route("/experience", get(resume::list_experience))
        .route("/education", get(resume::list_education))
        .route("/certifications", get(resume::list_certifications));

    let admin_routes = Router::new()
        .route(
            "/projects",
            get(admin::list_all_projects).post(admin::create_project),
        )
        .route("/projects/check-slug", get(admin::check_slug))
        .route("/projects/generate-slugs", post(admin::generate_slugs))
        .route(
            "/projects/{id}",
            put(admin::update_project).delete(admin::delete_project),
        )
        .route("/resume/profile", put(admin::upsert_profile))
        .route("/resume/experience", post(admin::create_experience))
        .route(
            "/resume/experience/{id}",
            put(admin::update_experience).delete(admin::delete_experience),
        )
        .route("/resume/education", post(admin::create_education))
        .route(
            "/resume/education/{id}",
            put(admin::update_education).delete(admin::delete_education),
        )
        .route("/resume/certifications", post(admin::create_certification))
        .route(
            "/resume/certifications/{id}",
            put(admin::update_certification).delete(admin::delete_certification),
        )
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
        .route("/settings", get(admin::get_settings).put(admin::update_settings));

    Router::new()
        .merge(credential_routes)
        .route("/logout", post(auth::logout))
        .nest("/api/auth", auth_routes)
        .nest("/api/projects", project_routes)
        .nest("/api/resume", resume_routes)
        .nest("/admin", admin_routes)
        // The guard sees every request: no decision is cached across requests.
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
